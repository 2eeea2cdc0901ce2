use crate::classify::ClassifiedAlert;
use chrono::{DateTime, FixedOffset};
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

/// Receives classified alerts for display. Delivery is fire and forget.
pub trait AlertSink {
    fn deliver(&self, alert: &ClassifiedAlert);
}

#[derive(Debug, Default)]
pub struct ConsoleSink;

impl AlertSink for ConsoleSink {
    fn deliver(&self, alert: &ClassifiedAlert) {
        println!("{}", render(alert));
    }
}

fn format_time(time: &Option<DateTime<FixedOffset>>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M %:z").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub fn render(alert: &ClassifiedAlert) -> Table {
    let rgb = alert.color.rgb();
    let color = Color::Rgb {
        r: (rgb >> 16) as u8,
        g: (rgb >> 8) as u8,
        b: rgb as u8,
    };
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![Cell::new(&alert.title).fg(color)]);
    table.add_row(vec![alert.description.trim()]);
    table.add_row(vec![format!(
        "ONSET: {}\nEXPIRES: {}",
        format_time(&alert.onset),
        format_time(&alert.expires)
    )]);
    table
}
