// src/stages/banner.rs

use chrono::{Local, NaiveDate};

/// Render a banner template, replacing `{date}` with today's date.
pub fn render(template: &str) -> String {
    render_for_date(template, Local::now().date_naive())
}

/// Render a banner template for a fixed date (`dd-mm-yyyy`).
pub fn render_for_date(template: &str, date: NaiveDate) -> String {
    template.replace("{date}", &date.format("%d-%m-%Y").to_string())
}

/// Place `banner` on its own line above `content`.
pub fn apply(content: &str, banner: &str) -> String {
    format!("{banner}\n{content}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_date_placeholder() {
        let date = NaiveDate::from_ymd_opt(2016, 2, 11).unwrap();
        assert_eq!(
            render_for_date("/* @created_at {date} */", date),
            "/* @created_at 11-02-2016 */"
        );
    }

    #[test]
    fn banner_goes_on_top() {
        assert_eq!(apply("a{}", "/* b */"), "/* b */\na{}");
    }
}
