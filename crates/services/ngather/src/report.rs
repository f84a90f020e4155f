//! Operator facing output.
//!
//! Nothing printed here is persisted, it's a quick health check of the
//! device shown while the gather runs.

use std::io::Write;

use ng_device::{ChassisAlarms, DeviceFacts, LoadAverages};

use crate::prelude::*;

const RULE_WIDTH: usize = 100;
const UNKNOWN: &str = "unknown";

fn rule<W: Write>(writer: &mut W, c: char) -> Result<()> {
    writeln!(writer, "{}", c.to_string().repeat(RULE_WIDTH))?;
    Ok(())
}

/// Banner printed once, before the first device.
pub fn write_run_banner<W: Write>(mut writer: W, phase_dir: &std::path::Path) -> Result<()> {
    rule(&mut writer, '#')?;
    writeln!(writer, "Script will write output to {}", phase_dir.display())?;
    Ok(())
}

/// Identity, alarms and load averages of one device.
pub fn write_device_health<W: Write>(
    mut writer: W,
    facts: &DeviceFacts,
    alarms: &ChassisAlarms,
    load: &LoadAverages,
) -> Result<()> {
    rule(&mut writer, '=')?;
    writeln!(
        writer,
        "Device hostname is '{}'\n\nSoftware version is '{}'\n",
        facts.hostname.as_deref().unwrap_or(UNKNOWN),
        facts.version.as_deref().unwrap_or(UNKNOWN)
    )?;

    if !alarms.is_empty() {
        rule(&mut writer, '=')?;
        writeln!(writer, "There are chassis alarms:")?;
        for alarm in alarms.iter() {
            match &alarm.class {
                Some(class) => writeln!(writer, "{}: {}", class, alarm.description)?,
                None => writeln!(writer, "{}", alarm.description)?,
            }
        }
        rule(&mut writer, '=')?;
    }

    rule(&mut writer, '=')?;
    writeln!(
        writer,
        "Load Averages:    {}    {}    {}",
        load.one.as_deref().unwrap_or(UNKNOWN),
        load.five.as_deref().unwrap_or(UNKNOWN),
        load.fifteen.as_deref().unwrap_or(UNKNOWN)
    )?;
    rule(&mut writer, '=')?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ng_device::ChassisAlarm;

    fn render(alarms: ChassisAlarms) -> String {
        let facts = DeviceFacts {
            hostname: Some("edge-r1".to_string()),
            version: None,
        };
        let load = LoadAverages {
            one: Some("0.12".to_string()),
            five: Some("0.08".to_string()),
            fifteen: Some("0.05".to_string()),
        };
        let mut out = Vec::new();
        write_device_health(&mut out, &facts, &alarms, &load).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn health_without_alarms() {
        let text = render(ChassisAlarms::default());
        assert!(text.contains("Device hostname is 'edge-r1'"));
        assert!(text.contains("Software version is 'unknown'"));
        assert!(text.contains("Load Averages:    0.12    0.08    0.05"));
        assert!(!text.contains("chassis alarms"));
    }

    #[test]
    fn health_lists_alarms() {
        let text = render(ChassisAlarms(vec![
            ChassisAlarm {
                class: Some("Major".to_string()),
                description: "PEM 0 Not OK".to_string(),
            },
            ChassisAlarm {
                class: None,
                description: "Host 0 Boot from alternate media".to_string(),
            },
        ]));
        assert!(text.contains("There are chassis alarms:\nMajor: PEM 0 Not OK\nHost 0 Boot from alternate media\n"));
    }
}
