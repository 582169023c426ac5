//! Journey Planner results page parsing.
//!
//! The legacy results page renders journeys as rows of a table. The table is
//! located by id, then by class, then by its "Journey Options" caption.
//! When it cannot be found we report any error-looking elements instead.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::domain::{JourneyLeg, JourneyOption, LegType};

static TABLE_BY_ID: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table#jrne-opt-tbl").expect("valid selector"));
static TABLE_BY_CLASS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table.jrne-opt-tbl").expect("valid selector"));
static TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("valid selector"));
static CAPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("caption").expect("valid selector"));
static TBODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tbody").expect("valid selector"));
static LEAVE_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.itemLeave").expect("valid selector"));
static ARRIVE_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.itemArrive").expect("valid selector"));
static TIME_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.itemTime").expect("valid selector"));
static ROUTE_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td.itemRoute").expect("valid selector"));
static LEG_LIST: LazyLock<Selector> = LazyLock::new(|| Selector::parse("ol").expect("valid selector"));
static ICON: LazyLock<Selector> = LazyLock::new(|| Selector::parse("i").expect("valid selector"));
static LABEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span").expect("valid selector"));
static SERVICE_CODE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.tp-service-code").expect("valid selector"));
static MESSAGE_CANDIDATES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div, p").expect("valid selector"));

static ERROR_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)error|alert|warning").expect("valid regex"));
static LEAVE_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2}:\d{2}(?:am|pm))").expect("valid regex"));
static MISSING_PARAMETER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)missing\s+(?:required\s+)?parameter").expect("valid regex"));

/// Icon class tokens, checked in order.
const ICON_TYPES: [(&str, LegType); 5] = [
    ("icon-walk", LegType::Walk),
    ("icon-bus-circ", LegType::Bus),
    ("icon-train-circ", LegType::Train),
    ("icon-ferry", LegType::Ferry),
    ("icon-cat", LegType::Cat),
];

/// Everything the client needs from one results page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultsPage {
    pub options: Vec<JourneyOption>,
    pub has_results_table: bool,
    /// Text of error/alert/warning elements; only collected when no table was found.
    pub error_messages: Vec<String>,
    /// The page says a request parameter was missing.
    pub missing_parameter: bool,
}

/// Parse a results page.
pub fn parse_page(html: &str) -> ResultsPage {
    let document = Html::parse_document(html);

    let Some(table) = find_results_table(&document) else {
        warn!("Journey options table not found, checking for error messages");
        let error_messages = error_messages(&document);
        for message in &error_messages {
            warn!(message = %message, "Possible error message");
        }
        let page_text: String = document.root_element().text().collect();
        return ResultsPage {
            options: Vec::new(),
            has_results_table: false,
            error_messages,
            missing_parameter: MISSING_PARAMETER.is_match(&page_text),
        };
    };

    ResultsPage {
        options: parse_rows(table),
        has_results_table: true,
        error_messages: Vec::new(),
        missing_parameter: false,
    }
}

/// Journey options on a results page, in document order.
///
/// Never fails: a page without a results table yields no options.
pub fn normalize(html: &str) -> Vec<JourneyOption> {
    parse_page(html).options
}

/// Text of every `div`/`p` whose class looks like an error, alert or warning.
pub fn page_errors(html: &str) -> Vec<String> {
    error_messages(&Html::parse_document(html))
}

fn find_results_table(document: &Html) -> Option<ElementRef<'_>> {
    document
        .select(&TABLE_BY_ID)
        .next()
        .or_else(|| document.select(&TABLE_BY_CLASS).next())
        .or_else(|| {
            document.select(&TABLE).find(|table| {
                table
                    .select(&CAPTION)
                    .next()
                    .is_some_and(|caption| caption.text().collect::<String>().contains("Journey Options"))
            })
        })
}

fn error_messages(document: &Html) -> Vec<String> {
    document
        .select(&MESSAGE_CANDIDATES)
        .filter(|el| {
            el.value()
                .attr("class")
                .is_some_and(|class| ERROR_CLASS.is_match(class))
        })
        .map(stripped_text)
        .filter(|text| !text.is_empty())
        .collect()
}

fn parse_rows(table: ElementRef<'_>) -> Vec<JourneyOption> {
    let Some(tbody) = table.select(&TBODY).next() else {
        warn!("Journey options tbody not found");
        return Vec::new();
    };

    let rows: Vec<ElementRef<'_>> = child_elements(tbody, "tr").collect();
    if rows.is_empty() {
        warn!("No journey option rows found");
        return Vec::new();
    }

    let mut options = Vec::with_capacity(rows.len());

    for (position, row) in rows.into_iter().enumerate() {
        let index = position as u32 + 1;
        match parse_row(row, index) {
            Some(option) => options.push(option),
            None => debug!(row = index, "Skipping row without journey cells"),
        }
    }

    options
}

/// Parse one row. Rows with neither a leave nor an arrive cell are not journeys.
fn parse_row(row: ElementRef<'_>, index: u32) -> Option<JourneyOption> {
    let leave_cell = row.select(&LEAVE_CELL).next();
    let arrive_cell = row.select(&ARRIVE_CELL).next();
    if leave_cell.is_none() && arrive_cell.is_none() {
        return None;
    }

    let leave_time = leave_cell
        .map(|cell| {
            let text = stripped_text(cell);
            LEAVE_TIME
                .captures(&text)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or(text)
        })
        .unwrap_or_default();

    let arrive_time = arrive_cell.map(stripped_text).unwrap_or_default();
    let travel_time = row.select(&TIME_CELL).next().map(stripped_text).unwrap_or_default();

    let legs = row
        .select(&ROUTE_CELL)
        .next()
        .and_then(|cell| cell.select(&LEG_LIST).next())
        .map(|list| child_elements(list, "li").map(parse_leg).collect())
        .unwrap_or_default();

    Some(JourneyOption {
        leave_time,
        arrive_time,
        travel_time,
        legs,
        index,
    })
}

fn parse_leg(item: ElementRef<'_>) -> JourneyLeg {
    let leg_type = item
        .select(&ICON)
        .next()
        .and_then(|icon| icon.value().attr("class"))
        .map(leg_type_for_icon)
        .unwrap_or_default();

    let description = item.select(&LABEL).next().map(stripped_text).unwrap_or_default();

    let service_code = item
        .select(&SERVICE_CODE)
        .next()
        .map(stripped_text);

    JourneyLeg {
        leg_type,
        description,
        service_code,
    }
}

/// Map an icon's class attribute to a leg type; unknown icons are walks.
pub fn leg_type_for_icon(class: &str) -> LegType {
    ICON_TYPES
        .iter()
        .find(|(token, _)| class.contains(token))
        .map(|(_, leg_type)| *leg_type)
        .unwrap_or_default()
}

fn child_elements<'a>(parent: ElementRef<'a>, tag: &'static str) -> impl Iterator<Item = ElementRef<'a>> {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |el| el.value().name() == tag)
}

/// Text content with each text node trimmed and joined without separators.
fn stripped_text(el: ElementRef<'_>) -> String {
    el.text().map(str::trim).collect()
}
