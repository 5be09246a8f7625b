use tracing::{debug, warn};

use crate::model::{
    FieldQuadrants, LiveDocument, MatchSnapshot, QuadrantColor, QuadrantTable, TeamDirectory,
    UpcomingScheduleTable, parse_match_header,
};

use super::{
    MalformedDocument, SnapshotExtractor,
    html::{Element, Selector},
};

const MATCH_FIELD_CELL_STYLE: &str = "white-space:nowrap";

/// Extraction rules for the marquee and pit display pages of the scoring system.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarqueeExtractor;

impl MarqueeExtractor {
    /// Quadrant labels of every `.fields > .field` block.
    fn field_table(&self, fields: &Element<'_>) -> QuadrantTable {
        let mut table = QuadrantTable::new();

        for field in fields.find_all(Selector::class("field")) {
            let field_num = match field_number(&field) {
                Ok(number) => number,
                Err(err) => {
                    warn!(error = %err, "skipping field block");
                    continue;
                }
            };

            let mut quads = FieldQuadrants::new();
            for color in QuadrantColor::ALL {
                let class = format!("light-{color}");
                match field.first(Selector::tag_class("td", &class)) {
                    Some(cell) => {
                        quads.insert(color, cell.text());
                    }
                    None => warn!(field = field_num, %color, "quadrant cell missing"),
                }
            }
            table.insert(field_num, quads);
        }

        table
    }
}

/// Field number from a header cell such as `Field 2`.
fn field_number(field: &Element<'_>) -> Result<u32, MalformedDocument> {
    let header = field
        .first(Selector::tag("th"))
        .ok_or(MalformedDocument::MissingElement("table > tr > th"))?
        .text();

    header
        .split_whitespace()
        .last()
        .and_then(|token| token.parse().ok())
        .ok_or(MalformedDocument::InvalidNumber {
            what: "field number",
            text: header,
        })
}

/// Match and field numbers from a cell such as `12 - 1`.
fn match_and_field(text: &str) -> Result<(u32, u32), MalformedDocument> {
    let invalid = || MalformedDocument::InvalidNumber {
        what: "match - field pair",
        text: text.to_string(),
    };

    let (match_part, field_part) = text.split_once(" - ").ok_or_else(invalid)?;
    let match_num = match_part.trim().parse().map_err(|_| invalid())?;
    let field_num = field_part.trim().parse().map_err(|_| invalid())?;
    Ok((match_num, field_num))
}

fn body_text(body: &[u8]) -> String {
    String::from_utf8_lossy(body).into_owned()
}

/// Rows of every `table > tbody`.
fn table_rows<'a>(root: &Element<'a>) -> Vec<Element<'a>> {
    root.find_all(Selector::tag("tbody"))
        .iter()
        .flat_map(|body| body.find_all(Selector::tag("tr")))
        .collect()
}

impl SnapshotExtractor for MarqueeExtractor {
    fn live_document(&self, body: &[u8]) -> LiveDocument {
        let text = body_text(body);
        if text.trim().is_empty() {
            return LiveDocument::Blank;
        }

        let root = Element::document(&text);
        let Some(name_and_timer) = root.first(Selector::class("nameAndTimer")) else {
            debug!(error = %MalformedDocument::MissingElement(".nameAndTimer"), "treating live document as blank");
            return LiveDocument::Blank;
        };
        let Some(timer) = name_and_timer.first(Selector::tag("h2")) else {
            warn!(error = %MalformedDocument::MissingElement(".nameAndTimer > h2"), "treating live document as blank");
            return LiveDocument::Blank;
        };

        let header = match name_and_timer.first(Selector::tag("h3")) {
            Some(h3) => parse_match_header(&h3.text()),
            None => {
                warn!(error = %MalformedDocument::MissingElement(".nameAndTimer > h3"), "match header not found");
                None
            }
        };

        let fields = match root.first(Selector::class("fields")) {
            Some(fields) => self.field_table(&fields),
            None => {
                warn!(error = %MalformedDocument::MissingElement(".fields"), "field blocks not found");
                QuadrantTable::new()
            }
        };

        LiveDocument::Match(MatchSnapshot {
            header,
            timer_text: timer.text(),
            fields,
        })
    }

    fn upcoming_schedule(&self, body: &[u8]) -> UpcomingScheduleTable {
        let text = body_text(body);
        let root = Element::document(&text);
        let rows = table_rows(&root);
        if rows.is_empty() {
            warn!(error = %MalformedDocument::MissingElement("table > tbody > tr"), "no upcoming match rows");
            return UpcomingScheduleTable::new();
        }

        let mut schedule = UpcomingScheduleTable::new();
        for row in rows {
            let Some(cell) = row.find_all(Selector::tag("td")).into_iter().find(|td| {
                td.attr("style")
                    .is_some_and(|style| style.replace(' ', "") == MATCH_FIELD_CELL_STYLE)
            }) else {
                continue;
            };

            let (match_num, field_num) = match match_and_field(&cell.text()) {
                Ok(pair) => pair,
                Err(err) => {
                    warn!(error = %err, "skipping upcoming match row");
                    continue;
                }
            };

            let quads = schedule
                .entry(match_num)
                .or_default()
                .entry(field_num)
                .or_default();
            for color in QuadrantColor::ALL {
                let label = row
                    .first(Selector::tag_class("td", color.as_str()))
                    .map(|td| td.text())
                    .unwrap_or_default();
                quads.insert(color, label);
            }
        }

        debug!(matches = schedule.len(), "parsed upcoming match table");
        schedule
    }

    fn team_directory(&self, body: &[u8]) -> TeamDirectory {
        let text = body_text(body);
        let root = Element::document(&text);
        let mut directory = TeamDirectory::default();

        for row in table_rows(&root) {
            let cells = row.find_all(Selector::tag("td"));
            let [number, name, ..] = cells.as_slice() else {
                continue;
            };
            match number.text().parse::<u32>() {
                Ok(team) => directory.insert(team, name.text()),
                Err(_) => debug!(text = %number.text(), "skipping team row without a number"),
            }
        }

        directory
    }

    fn current_phase(&self, body: &[u8]) -> Option<String> {
        let text = body_text(body);
        let root = Element::document(&text);
        let phase = root.first(Selector::class("current-phase"))?.text();
        (!phase.is_empty()).then_some(phase)
    }
}
