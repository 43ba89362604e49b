//! Plain-text rendering of the dashboard view.

use std::fmt::Write as _;

use dashboard_core::{
    item_edit::EditMode, DashboardView, ListStatus, Notice, NoticeLevel,
};
use shared::domain::SpyCat;

/// `1234567.5` -> `$1,234,567.5`; at most two fractional digits are kept.
pub fn format_salary(salary: f64) -> String {
    let rounded = (salary * 100.0).round() / 100.0;
    let text = rounded.abs().to_string();
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole.to_string(), Some(fraction.to_string())),
        None => (text, None),
    };

    let mut grouped = String::new();
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded < 0.0 { "-" } else { "" };
    match fraction {
        Some(fraction) => format!("{sign}${grouped}.{fraction}"),
        None => format!("{sign}${grouped}"),
    }
}

pub fn render_cat(cat: &SpyCat) -> String {
    format!(
        "#{:<4} {:<20} {:<16} {:>3} years  {}",
        cat.id.0,
        cat.name,
        cat.breed,
        cat.years_of_experience,
        format_salary(cat.salary)
    )
}

pub fn render_view(view: &DashboardView) -> String {
    let mut out = String::new();
    match &view.status {
        ListStatus::Idle | ListStatus::Loading => {
            let _ = writeln!(out, "Loading spy cats...");
            return out;
        }
        ListStatus::Error(message) => {
            let _ = writeln!(out, "Error: {message}");
            let _ = writeln!(out, "[Try Again]");
            return out;
        }
        ListStatus::Ready => {}
    }

    if view.is_empty() {
        let _ = writeln!(out, "No spy cats found");
        let _ = writeln!(
            out,
            "Get started by adding your first spy cat to the team: spy-cats add ..."
        );
        return out;
    }

    let _ = writeln!(
        out,
        "Spy Cats ({})    Total Team Salary: {}",
        view.count(),
        format_salary(view.total_salary)
    );
    for card in &view.cards {
        let _ = write!(out, "{}", render_cat(&card.cat));
        if let EditMode::Editing { draft } = &card.item.mode {
            let _ = write!(out, "  (editing: {draft})");
        }
        out.push('\n');
    }
    out
}

pub fn render_notice(notice: &Notice) -> String {
    match notice.level {
        NoticeLevel::Success => format!("ok: {}", notice.message),
        NoticeLevel::Error => format!("error: {}", notice.message),
    }
}
