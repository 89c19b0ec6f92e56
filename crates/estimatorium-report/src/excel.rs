//! XLSX estimate report.
//!
//! One worksheet holding up to four tables, top to bottom:
//!
//! ```text
//! | Feature | Story   | Back dev | Front dev | Risks | Back dev | Front dev |
//! | Backend | Catalog | 20       |           | low   | =ROUNDUP | =ROUNDUP  |
//!
//! | Cleanup & acceptance | 15.0% |
//!
//! |          | Efforts (day) | With Risk | Rate | Team | Total |
//! | Back dev | =SUM(...)     | =SUM(...) | $60  | 2    | =...  |
//! | Sum      | ...                                           |
//!
//! |            | Timeframe draft |
//! | Duration   | =ROUND(...)     | Months |
//! | With risks | =ROUND(...)     | Months |
//! ```
//!
//! Everything derived from the inputs is written as a formula, so the sheet
//! stays live when efforts, risks or counts are edited by hand.

use std::collections::HashMap;
use std::path::Path;

use estimatorium_common_config::ReportConfig;
use estimatorium_core::formula;
use estimatorium_core::{
    Currency, Project, Resource, Risks, WORKING_DAYS_IN_MONTH, WORKING_HOURS_A_DAY,
};
use rust_xlsxwriter::{
    ColNum, DataValidation, Format, FormatAlign, FormatBorder, RowNum, Workbook, Worksheet,
};
use tracing::{debug, info, warn};

use crate::cells::{Cell, CellRange};
use crate::error::{ReportError, Result};

/// Column width padding, in characters.
const WIDTH_MARGIN: f64 = 2.0;

/// Renders a sized [`Project`] as a spreadsheet.
#[derive(Debug, Clone)]
pub struct ExcelReport {
    config: ReportConfig,
}

impl ExcelReport {
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Write the report to `path`.
    pub fn render(&self, project: &Project, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut workbook = self.workbook(project)?;
        workbook.save(path)?;
        info!(path = %path.display(), tasks = project.tasks.len(), team = project.team.len(), "wrote report");
        Ok(())
    }

    /// Report as XLSX bytes.
    pub fn render_to_buffer(&self, project: &Project) -> Result<Vec<u8>> {
        let mut workbook = self.workbook(project)?;
        Ok(workbook.save_to_buffer()?)
    }

    fn workbook(&self, project: &Project) -> Result<Workbook> {
        if project.tasks.is_empty() {
            return Err(ReportError::EmptyProject);
        }

        let formats = ReportFormats::new(project.currency);
        let mut workbook = Workbook::new();
        {
            let sheet = workbook.add_worksheet();
            sheet.set_name(self.config.sheet_name.as_str())?;

            let mut writer = SheetWriter::new(sheet);
            self.write_tables(&mut writer, &formats, project)?;
            if self.config.autofit {
                writer.fit_columns(self.config.min_column_width)?;
            }
        }
        Ok(workbook)
    }

    fn write_tables(&self, w: &mut SheetWriter<'_>, formats: &ReportFormats, project: &Project) -> Result<()> {
        let tasks = tasks_table(w, formats, project)?;
        let mut row = tasks.next_row;

        let mut acceptance = None;
        if project.acceptance_percent > 0.0 {
            w.text(row, 0, "Cleanup & acceptance", &formats.value)?;
            w.number(row, 1, project.acceptance_percent / 100.0, &formats.percent)?;
            acceptance = Some(Cell::new(row, 1));
            row += 2;
        }

        let costs = costs_table(w, formats, project, &tasks, acceptance, row)?;

        if self.config.include_durations && !costs.direct.is_empty() {
            timeframe_table(w, formats, project, &costs)?;
        }
        Ok(())
    }
}

struct ReportFormats {
    header: Format,
    value: Format,
    task_name: Format,
    currency: Format,
    currency_bold: Format,
    percent: Format,
}

impl ReportFormats {
    fn new(currency: Option<Currency>) -> Self {
        let num_format = match currency {
            Some(c) => format!("[${}]#,##0", c.symbol()),
            None => "#,##0".to_string(),
        };
        let value = Format::new().set_border(FormatBorder::Thin);

        Self {
            header: Format::new()
                .set_bold()
                .set_font_color(0xFFFFFF)
                .set_align(FormatAlign::Center)
                .set_background_color(0x091E42),
            task_name: value.clone().set_background_color(0x93C47D),
            currency: value.clone().set_num_format(&num_format),
            currency_bold: value.clone().set_num_format(&num_format).set_bold(),
            percent: value.clone().set_num_format("0.0%"),
            value,
        }
    }
}

/// Worksheet wrapper that remembers how wide each column's content is.
struct SheetWriter<'a> {
    sheet: &'a mut Worksheet,
    widths: Vec<f64>,
}

impl<'a> SheetWriter<'a> {
    fn new(sheet: &'a mut Worksheet) -> Self {
        Self {
            sheet,
            widths: Vec::new(),
        }
    }

    fn fit(&mut self, col: ColNum, width: f64) {
        let col = usize::from(col);
        if self.widths.len() <= col {
            self.widths.resize(col + 1, 0.0);
        }
        self.widths[col] = self.widths[col].max(width);
    }

    fn text(&mut self, row: RowNum, col: ColNum, text: &str, format: &Format) -> Result<()> {
        if text.is_empty() {
            self.sheet.write_blank(row, col, format)?;
        } else {
            self.sheet.write_string_with_format(row, col, text, format)?;
            self.fit(col, text.chars().count() as f64 + WIDTH_MARGIN);
        }
        Ok(())
    }

    fn number(&mut self, row: RowNum, col: ColNum, value: f64, format: &Format) -> Result<()> {
        self.sheet.write_number_with_format(row, col, value, format)?;
        self.fit(col, value.to_string().len() as f64 + WIDTH_MARGIN);
        Ok(())
    }

    fn blank(&mut self, row: RowNum, col: ColNum, format: &Format) -> Result<()> {
        self.sheet.write_blank(row, col, format)?;
        Ok(())
    }

    fn formula(&mut self, row: RowNum, col: ColNum, formula: &str, format: &Format) -> Result<()> {
        self.sheet.write_formula_with_format(row, col, formula, format)?;
        Ok(())
    }

    /// Text merged across `first_col..=last_col` of one row, or down
    /// `first_row..=last_row` of one column.
    fn merged(&mut self, first: Cell, last: Cell, text: &str, format: &Format) -> Result<()> {
        if first == last {
            return self.text(first.row, first.col, text, format);
        }
        self.sheet
            .merge_range(first.row, first.col, last.row, last.col, text, format)?;

        let span = f64::from(last.col - first.col + 1);
        let width = (text.chars().count() as f64 + WIDTH_MARGIN) / span;
        for col in first.col..=last.col {
            self.fit(col, width);
        }
        Ok(())
    }

    fn validation(&mut self, first: Cell, last: Cell, validation: &DataValidation) -> Result<()> {
        self.sheet
            .add_data_validation(first.row, first.col, last.row, last.col, validation)?;
        Ok(())
    }

    fn header(&mut self, row: RowNum, columns: &[(&str, ColNum)], format: &Format) -> Result<()> {
        let mut col = 0;
        for (title, span) in columns {
            let last = col + span - 1;
            self.merged(Cell::new(row, col), Cell::new(row, last), title, format)?;
            col = last + 1;
        }
        Ok(())
    }

    fn fit_columns(&mut self, min_width: f64) -> Result<()> {
        for (col, width) in self.widths.iter().enumerate() {
            let col = ColNum::try_from(col).unwrap_or(ColNum::MAX);
            self.sheet.set_column_width(col, width.max(min_width))?;
        }
        debug!(columns = self.widths.len(), "fitted column widths");
        Ok(())
    }
}

/// Where the tasks table put each direct resource's columns.
struct TaskColumns {
    efforts: HashMap<String, CellRange>,
    with_risk: HashMap<String, CellRange>,
    next_row: RowNum,
}

fn tasks_table(w: &mut SheetWriter<'_>, formats: &ReportFormats, project: &Project) -> Result<TaskColumns> {
    let direct = project.team_excluding_derived();
    let n = direct.len() as ColNum;
    let effort_col = |j: usize| 3 + j as ColNum;
    let risk_col = 3 + n;
    let with_risk_col = |j: usize| 4 + n + j as ColNum;

    let mut columns: Vec<(&str, ColNum)> = vec![("Feature", 1), ("Story", 2)];
    columns.extend(direct.iter().map(|r| (r.title.as_str(), 1)));
    columns.push(("Risks", 1));
    columns.extend(direct.iter().map(|r| (r.title.as_str(), 1)));
    w.header(0, &columns, &formats.header)?;

    let tasks = &project.tasks;
    let first_row: RowNum = 1;
    let last_row = first_row + tasks.len() as RowNum - 1;

    let mut run_start = 0;
    for i in 1..=tasks.len() {
        if i == tasks.len() || tasks[i].category != tasks[run_start].category {
            let first = Cell::new(first_row + run_start as RowNum, 0);
            let last = Cell::new(first_row + i as RowNum - 1, 0);
            w.merged(first, last, &tasks[run_start].category, &formats.value)?;
            run_start = i;
        }
    }

    for (i, task) in tasks.iter().enumerate() {
        let row = first_row + i as RowNum;
        w.merged(Cell::new(row, 1), Cell::new(row, 2), &task.title, &formats.task_name)?;

        for (j, resource) in direct.iter().enumerate() {
            match task.work.get(&resource.id) {
                Some(effort) => w.number(row, effort_col(j), *effort, &formats.value)?,
                None => w.blank(row, effort_col(j), &formats.value)?,
            }
        }

        let risk_cell = Cell::new(row, risk_col);
        w.text(row, risk_col, &task.risk, &formats.value)?;

        for j in 0..direct.len() {
            let effort_cell = Cell::new(row, effort_col(j));
            w.formula(
                row,
                with_risk_col(j),
                &risk_formula(&project.risks, effort_cell, risk_cell),
                &formats.value,
            )?;
        }
    }

    if let Some(list) = risk_validation(&project.risks) {
        w.validation(Cell::new(first_row, risk_col), Cell::new(last_row, risk_col), &list)?;
    }

    let mut columns = TaskColumns {
        efforts: HashMap::new(),
        with_risk: HashMap::new(),
        next_row: last_row + 2,
    };
    for (j, resource) in direct.iter().enumerate() {
        columns.efforts.insert(
            resource.id.clone(),
            CellRange::column(effort_col(j), first_row, last_row),
        );
        columns.with_risk.insert(
            resource.id.clone(),
            CellRange::column(with_risk_col(j), first_row, last_row),
        );
    }
    Ok(columns)
}

/// Drop-down of risk names for the risk column. `None` when there are no
/// risks or the names exceed Excel's 255 character list limit.
pub(crate) fn risk_validation(risks: &Risks) -> Option<DataValidation> {
    if risks.is_empty() {
        return None;
    }
    let names: Vec<&str> = risks.keys().map(String::as_str).collect();
    match DataValidation::new().allow_list_strings(names.as_slice()) {
        Ok(validation) => Some(validation),
        Err(e) => {
            warn!(error = %e, "risk names do not fit a drop-down list");
            None
        }
    }
}

/// `ROUNDUP(effort * multiplier-of-risk, 0)`; an empty risk cell counts as 1.
pub(crate) fn risk_formula(risks: &Risks, effort: Cell, risk: Cell) -> String {
    let mut formula = format!("ROUNDUP({effort}*_xlfn.SWITCH({risk},\"\",1");
    for (name, multiplier) in risks {
        formula.push_str(&format!(",\"{}\",{}", name.replace('"', "\"\""), multiplier));
    }
    formula.push_str("),0)");
    formula
}

/// Cells of one resource's row in the costs table.
#[derive(Debug, Clone, Copy)]
struct CostCells {
    efforts: Cell,
    with_risk: Cell,
    count: Cell,
}

struct CostsTable {
    /// Direct resources in team order.
    direct: Vec<CostCells>,
    next_row: RowNum,
}

fn costs_table(
    w: &mut SheetWriter<'_>,
    formats: &ReportFormats,
    project: &Project,
    tasks: &TaskColumns,
    acceptance: Option<Cell>,
    start_row: RowNum,
) -> Result<CostsTable> {
    let efforts_title = format!("Efforts ({})", project.effort_unit());
    w.header(
        start_row,
        &[
            ("", 1),
            (efforts_title.as_str(), 1),
            ("With Risk", 1),
            ("Rate", 1),
            ("Team", 1),
            ("Total", 1),
        ],
        &formats.header,
    )?;

    let hours = project.effort_unit().hours();
    let first_row = start_row + 1;
    let mut direct = Vec::new();

    for (k, resource) in project.team.iter().enumerate() {
        let row = first_row + k as RowNum;
        let cells = CostCells {
            efforts: Cell::new(row, 1),
            with_risk: Cell::new(row, 2),
            count: Cell::new(row, 4),
        };
        let rate_cell = Cell::new(row, 3);

        w.text(row, 0, &resource.title, &formats.header)?;
        let efforts = efforts_formula(project, resource, &tasks.efforts, acceptance)?;
        w.formula(row, 1, &efforts, &formats.value)?;
        let with_risk = efforts_formula(project, resource, &tasks.with_risk, acceptance)?;
        w.formula(row, 2, &with_risk, &formats.value)?;
        w.number(row, 3, resource.rate, &formats.currency)?;
        w.number(row, 4, f64::from(resource.count), &formats.value)?;
        w.formula(
            row,
            5,
            &format!("{hours}*{}*{rate_cell}", cells.with_risk),
            &formats.currency,
        )?;

        if resource.is_direct() {
            direct.push(cells);
        }
    }

    let sum_row = first_row + project.team.len() as RowNum;
    w.text(sum_row, 0, "Sum", &formats.header)?;
    if project.team.is_empty() {
        w.number(sum_row, 1, 0.0, &formats.value)?;
        w.number(sum_row, 2, 0.0, &formats.value)?;
        w.number(sum_row, 5, 0.0, &formats.currency_bold)?;
    } else {
        let last_row = sum_row - 1;
        w.formula(sum_row, 1, &CellRange::column(1, first_row, last_row).sum(), &formats.value)?;
        w.formula(sum_row, 2, &CellRange::column(2, first_row, last_row).sum(), &formats.value)?;
        w.formula(
            sum_row,
            5,
            &CellRange::column(5, first_row, last_row).sum(),
            &formats.currency_bold,
        )?;
    }
    w.blank(sum_row, 3, &formats.value)?;
    w.blank(sum_row, 4, &formats.value)?;

    Ok(CostsTable {
        direct,
        next_row: sum_row + 2,
    })
}

/// Efforts of one resource as a formula over the tasks table.
///
/// Derived resources have their formula expanded: direct ids become sums
/// of their task column, derived ids are expanded in place and ids missing
/// from the team become 0.
pub(crate) fn efforts_formula(
    project: &Project,
    resource: &Resource,
    columns: &HashMap<String, CellRange>,
    acceptance: Option<Cell>,
) -> Result<String> {
    let expression = expand(project, resource, columns, 0)?;
    Ok(match acceptance {
        None => expression,
        Some(cell) if resource.is_derived() => format!("({expression})*(1+{})", cell.absolute()),
        Some(cell) => format!("{expression}*(1+{})", cell.absolute()),
    })
}

fn expand(
    project: &Project,
    resource: &Resource,
    columns: &HashMap<String, CellRange>,
    depth: usize,
) -> Result<String> {
    if resource.is_direct() {
        return Ok(columns
            .get(&resource.id)
            .map_or_else(|| "0".to_string(), CellRange::sum));
    }
    if depth > project.team.len() {
        return Err(ReportError::CircularFormula {
            resource: resource.id.clone(),
        });
    }

    let mut failure = None;
    let expanded = formula::substitute(&resource.formula, |id| {
        // Resources without task work are dropped by sizing; they count as 0.
        let Some(referenced) = project.resource(id) else {
            return Some("0".to_string());
        };
        if referenced.is_direct() {
            return Some(columns.get(id).map_or_else(|| "0".to_string(), CellRange::sum));
        }
        match expand(project, referenced, columns, depth + 1) {
            Ok(inner) => Some(format!("({inner})")),
            Err(e) => {
                failure.get_or_insert(e);
                None
            }
        }
    });

    match failure {
        Some(e) => Err(e),
        None => Ok(expanded),
    }
}

fn timeframe_table(
    w: &mut SheetWriter<'_>,
    formats: &ReportFormats,
    project: &Project,
    costs: &CostsTable,
) -> Result<()> {
    let row = costs.next_row;
    w.header(row, &[("", 1), ("Timeframe draft", 2)], &formats.header)?;

    let hours = project.effort_unit().hours();
    let rows: [(&str, fn(&CostCells) -> Cell); 2] = [
        ("Duration", |c| c.efforts),
        ("With risks", |c| c.with_risk),
    ];
    for (i, (label, pick)) in rows.iter().enumerate() {
        let r = row + 1 + i as RowNum;
        let parts: Vec<(Cell, Cell)> = costs.direct.iter().map(|c| (pick(c), c.count)).collect();
        w.text(r, 0, label, &formats.header)?;
        w.formula(r, 1, &duration_formula(&parts, hours), &formats.value)?;
        w.text(r, 2, "Months", &formats.value)?;
    }
    Ok(())
}

/// Months the slowest resource needs: `ROUND(MAX(effort/count, ...) * hours / 8 / 21, 1)`.
pub(crate) fn duration_formula(parts: &[(Cell, Cell)], unit_hours: u32) -> String {
    let ratios: Vec<String> = parts
        .iter()
        .map(|(effort, count)| format!("{effort}/{count}"))
        .collect();
    format!(
        "ROUND(MAX({})*{unit_hours}/{WORKING_HOURS_A_DAY}/{WORKING_DAYS_IN_MONTH},1)",
        ratios.join(",")
    )
}
