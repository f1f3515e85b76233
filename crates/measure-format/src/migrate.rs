use part_types::KernelTolerance;

use crate::errors::LoadError;
use crate::load::PresetFileRaw;
use crate::preset::MeasurePreset;

/// Bring a parsed preset file up to `to_version`.
///
/// Migrations are applied sequentially: v1→v2, v2→v3, etc.
pub(crate) fn migrate(mut raw: PresetFileRaw, to_version: u32) -> Result<MeasurePreset, LoadError> {
    while raw.version < to_version {
        raw = match raw.version {
            1 => migrate_v1_to_v2(raw)?,
            v => {
                return Err(LoadError::MigrationFailed {
                    from: v,
                    to: to_version,
                    reason: format!("no migration path from v{v}"),
                })
            }
        };
    }
    if raw.tolerance.is_some() {
        return Err(LoadError::ParseError(format!(
            "`tolerance` is not a field of version {} presets; use `settings`",
            raw.version
        )));
    }
    Ok(MeasurePreset {
        part: raw.part,
        metadata: raw.preset,
        settings: raw.settings.unwrap_or_default(),
        measures: raw.measures,
    })
}

/// v1 had one `tolerance` number: the boolean overlap slack.
fn migrate_v1_to_v2(mut raw: PresetFileRaw) -> Result<PresetFileRaw, LoadError> {
    if raw.settings.is_some() {
        return Err(LoadError::MigrationFailed {
            from: 1,
            to: 2,
            reason: "version 1 presets have no `settings` block".to_string(),
        });
    }
    let settings = match raw.tolerance.take() {
        Some(slack) => KernelTolerance {
            overlap_slack: slack,
            ..KernelTolerance::default()
        },
        None => KernelTolerance::default(),
    };
    raw.settings = Some(settings);
    raw.version = 2;
    Ok(raw)
}
