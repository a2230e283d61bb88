use almanac::{calendar::Weekday, schedule::WeeklySchedule};
use comfy_table::{Attribute, Cell, Color, Table, modifiers, presets};

/// Date periods with the day patterns of their week groups.
///
/// The default day pattern is dimmed so that the rule-driven days stand out.
pub fn build_weeks_table(schedule: &WeeklySchedule) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();

    let mut header = vec!["Start", "End", "Week"];
    header.extend(Weekday::ALL.map(|weekday| &weekday.name()[..3]));
    header.extend(["Holiday", "Summer design", "Winter design"]);
    table.set_header(header);

    let day_cell = |identifier: &str| {
        let cell = Cell::new(identifier);
        if identifier == schedule.default_day_pattern {
            cell.add_attribute(Attribute::Dim)
        } else {
            cell.fg(Color::Green)
        }
    };
    for period in &schedule.periods {
        let Some(week) = schedule.week(&period.week) else {
            continue;
        };
        let mut row = vec![
            Cell::new(period.range.start_date()),
            Cell::new(period.range.end_date()).add_attribute(Attribute::Dim),
            Cell::new(&week.identifier).fg(Color::Cyan),
        ];
        let special_days = [&week.holiday, &week.summer_design, &week.winter_design];
        row.extend(week.days.iter().chain(special_days).map(|identifier| day_cell(identifier)));
        table.add_row(row);
    }
    table
}
