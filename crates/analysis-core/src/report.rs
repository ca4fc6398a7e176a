//! Report renderer: serializes the aggregate views into a styled
//! multi-sheet workbook.
//!
//! One `Statistiques` sheet (title band, styled header, one row per
//! category summary, two pie charts), then one sheet per category with
//! that category's breakdown rows. The full identifier list never
//! appears as a visible column; it only seeds cell notes on the
//! occurrences column.

use rust_xlsxwriter::{
    Chart, ChartDataLabel, ChartType, Format, FormatAlign, FormatBorder, Note, Workbook,
    Worksheet, XlsxError,
};

use crate::error::AnalysisError;
use crate::model::{Category, CategorySummary, ExamBreakdownRow, SourceTag};

const STATS_SHEET: &str = "Statistiques";
const STATS_TITLE: &str = "Analyse des Appels - Statistiques Globales";
const NOTE_AUTHOR: &str = "Analyse des appels";

/// Excel caps sheet names at 31 characters.
const SHEET_NAME_LIMIT: usize = 31;

const TITLE_BG: &str = "#2E75B6";
const HEADER_BG: &str = "#4472C4";
const STRIPE_BG: &str = "#D9E1F2";
const ALERT_FONT: &str = "#C00000";

/// Render the summary and breakdown views into workbook bytes.
pub fn render(
    summaries: &[CategorySummary],
    breakdowns: &[ExamBreakdownRow],
) -> Result<Vec<u8>, AnalysisError> {
    let mut workbook = Workbook::new();

    write_statistics_sheet(workbook.add_worksheet(), summaries)?;

    for (category, rows) in breakdowns_by_category(breakdowns) {
        write_category_sheet(workbook.add_worksheet(), category, &rows)?;
    }

    Ok(workbook.save_to_buffer()?)
}

/// Group breakdown rows by category, preserving their (already sorted)
/// lexical sheet order.
fn breakdowns_by_category(
    breakdowns: &[ExamBreakdownRow],
) -> Vec<(Category, Vec<&ExamBreakdownRow>)> {
    let mut groups: Vec<(Category, Vec<&ExamBreakdownRow>)> = Vec::new();
    for row in breakdowns {
        match groups.last_mut() {
            Some((category, rows)) if *category == row.category => rows.push(row),
            _ => groups.push((row.category, vec![row])),
        }
    }
    groups
}

fn write_statistics_sheet(
    sheet: &mut Worksheet,
    summaries: &[CategorySummary],
) -> Result<(), XlsxError> {
    sheet.set_name(STATS_SHEET)?;

    let title_format = Format::new()
        .set_bold()
        .set_font_size(16)
        .set_font_color("#FFFFFF")
        .set_background_color(TITLE_BG)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);
    sheet.merge_range(0, 0, 0, 4, STATS_TITLE, &title_format)?;
    sheet.set_row_height(0, 30)?;

    let header = header_format();
    let headers = [
        "Catégorie",
        "Total",
        SourceTag::ExamNotFound.label(),
        SourceTag::ExamNotAuthorized.label(),
        "Tous les examens",
    ];
    for (col, text) in headers.iter().enumerate() {
        sheet.write_string_with_format(1, col as u16, *text, &header)?;
    }

    for (idx, summary) in summaries.iter().enumerate() {
        let row = 2 + idx as u32;
        let striped = (row + 1) % 2 == 0;
        let text = text_format(striped);
        let number = number_format(striped);
        let category_format = if summary.category == Category::IntitulesIncompris {
            alert_format(striped)
        } else {
            text_format(striped)
        };

        sheet.write_string_with_format(row, 0, summary.category.label(), &category_format)?;
        sheet.write_number_with_format(row, 1, summary.total as f64, &number)?;
        sheet.write_number_with_format(row, 2, summary.not_found as f64, &number)?;
        sheet.write_number_with_format(row, 3, summary.not_authorized as f64, &number)?;
        sheet.write_string_with_format(row, 4, &summary.all_exams, &text)?;
    }

    for (col, width) in [(0u16, 25.0), (1, 12.0), (2, 18.0), (3, 20.0), (4, 60.0)] {
        sheet.set_column_width(col, width)?;
    }

    if !summaries.is_empty() {
        add_charts(sheet, summaries)?;
    }

    Ok(())
}

/// Add the two pie charts below the summary table, plus the hidden
/// two-row helper table that feeds the tag-distribution chart.
fn add_charts(sheet: &mut Worksheet, summaries: &[CategorySummary]) -> Result<(), XlsxError> {
    let last_data_row = 1 + summaries.len() as u32;
    let helper_row = last_data_row + 2;
    let chart_row = last_data_row + 3;

    let total_not_found: usize = summaries.iter().map(|s| s.not_found).sum();
    let total_not_authorized: usize = summaries.iter().map(|s| s.not_authorized).sum();

    sheet.write_string(helper_row, 0, "Type")?;
    sheet.write_string(helper_row, 1, "Nombre")?;
    sheet.write_string(helper_row + 1, 0, SourceTag::ExamNotFound.label())?;
    sheet.write_number(helper_row + 1, 1, total_not_found as f64)?;
    sheet.write_string(helper_row + 2, 0, SourceTag::ExamNotAuthorized.label())?;
    sheet.write_number(helper_row + 2, 1, total_not_authorized as f64)?;
    // The helper table is chart input, not user-visible data.
    for row in helper_row..=helper_row + 2 {
        sheet.set_row_hidden(row)?;
    }

    let mut category_chart = Chart::new(ChartType::Pie);
    category_chart
        .title()
        .set_name("Répartition des examens par catégorie");
    category_chart
        .add_series()
        .set_name("Total")
        .set_categories((STATS_SHEET, 2, 0, last_data_row, 0))
        .set_values((STATS_SHEET, 2, 1, last_data_row, 1))
        .set_data_label(
            ChartDataLabel::new()
                .show_category_name()
                .show_value()
                .show_percentage(),
        );
    category_chart.set_width(680).set_height(454);
    sheet.insert_chart(chart_row, 0, &category_chart)?;

    let mut tag_chart = Chart::new(ChartType::Pie);
    tag_chart
        .title()
        .set_name("Répartition exam_not_found vs exam_not_authorized");
    tag_chart
        .add_series()
        .set_name("Nombre")
        .set_categories((STATS_SHEET, helper_row + 1, 0, helper_row + 2, 0))
        .set_values((STATS_SHEET, helper_row + 1, 1, helper_row + 2, 1))
        .set_data_label(
            ChartDataLabel::new()
                .show_category_name()
                .show_value()
                .show_percentage(),
        );
    tag_chart.set_width(680).set_height(454);
    sheet.insert_chart(chart_row, 10, &tag_chart)?;

    Ok(())
}

fn write_category_sheet(
    sheet: &mut Worksheet,
    category: Category,
    rows: &[&ExamBreakdownRow],
) -> Result<(), XlsxError> {
    let name: String = category.label().chars().take(SHEET_NAME_LIMIT).collect();
    sheet.set_name(name)?;

    let header = header_format();
    let headers = [
        "Catégorie",
        "Examen Identifié",
        "Occurrences",
        SourceTag::ExamNotFound.label(),
        SourceTag::ExamNotAuthorized.label(),
        "Id Externe",
    ];
    for (col, text) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *text, &header)?;
    }

    for (idx, breakdown) in rows.iter().enumerate() {
        let row = 1 + idx as u32;
        let striped = (row + 1) % 2 == 0;
        let text = text_format(striped);
        let number = number_format(striped);

        sheet.write_string_with_format(row, 0, breakdown.category.label(), &number)?;
        sheet.write_string_with_format(row, 1, &breakdown.exam_name, &text)?;
        sheet.write_number_with_format(row, 2, breakdown.occurrences as f64, &number)?;
        sheet.write_number_with_format(row, 3, breakdown.not_found as f64, &number)?;
        sheet.write_number_with_format(row, 4, breakdown.not_authorized as f64, &number)?;
        sheet.write_string_with_format(
            row,
            5,
            breakdown.external_id.as_deref().unwrap_or(""),
            &number,
        )?;

        // Rows backed by several identifiers get the full list as a note
        // on the occurrences cell.
        if breakdown.all_external_ids.len() > 1 {
            let note_text = format!(
                "{} Id Externes :\n\n{}",
                breakdown.all_external_ids.len(),
                breakdown.all_external_ids.join("\n")
            );
            let note = Note::new(note_text)
                .set_author(NOTE_AUTHOR)
                .set_width(400)
                .set_height(200);
            sheet.insert_note(row, 2, &note)?;
        }
    }

    for (col, width) in [(0u16, 25.0), (1, 60.0), (2, 15.0), (3, 20.0), (4, 20.0), (5, 20.0)] {
        sheet.set_column_width(col, width)?;
    }
    sheet.set_freeze_panes(1, 0)?;

    Ok(())
}

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_font_size(11)
        .set_font_color("#FFFFFF")
        .set_background_color(HEADER_BG)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin)
}

fn text_format(striped: bool) -> Format {
    let format = Format::new()
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Left)
        .set_align(FormatAlign::Top)
        .set_text_wrap();
    if striped {
        format.set_background_color(STRIPE_BG)
    } else {
        format
    }
}

fn number_format(striped: bool) -> Format {
    let format = Format::new()
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter);
    if striped {
        format.set_background_color(STRIPE_BG)
    } else {
        format
    }
}

fn alert_format(striped: bool) -> Format {
    text_format(striped).set_bold().set_font_color(ALERT_FONT)
}
