//! XLSX exporter that lays out record metadata as columns and attaches
//! dropdown validations.

use std::collections::BTreeMap;
use std::path::Path;

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use tracing::{debug, info, warn};

use crate::error::ExportResult;
use crate::extract::derive_field_descriptors;
use crate::order::{plan_column_index_map, validate_options};
use crate::source::{
    ExcelRecord, RecordSource, SpecRecordSlice, derive_dataframe_from_ipc_bytes,
};
use crate::spec::{
    EnumCellValue, SpecCellFormat, SpecColumnIndexMap, SpecExportOptions, SpecExportReport,
    SpecFieldDescriptor, SpecRecordType, SpecValidationConstraint,
};
use crate::util::{
    cast_col_num, cast_row_num, derive_column_letter, parse_replacement, sanitize_sheet_name,
};
use crate::validation::{apply_validation_constraints, plan_validation_constraints};

/// Column layout and constraints resolved for one record type.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecExportPlan {
    /// Type the plan was built for.
    pub type_name: String,
    /// Field-to-column assignment.
    pub column_map: SpecColumnIndexMap,
    /// Dropdown constraints, one per constrained field.
    pub constraints: Vec<SpecValidationConstraint>,
}

/// Stateless exporter; every call builds its own plan from scratch.
#[derive(Debug, Clone, Default)]
pub struct XlsxExporter {
    options: SpecExportOptions,
}

impl XlsxExporter {
    /// Create exporter with `options`.
    pub fn new(options: SpecExportOptions) -> Self {
        Self { options }
    }

    /// Options used by every export call.
    pub fn options(&self) -> &SpecExportOptions {
        &self.options
    }

    /// Extract, order and constrain the fields of `record_type`.
    pub fn plan(&self, record_type: &SpecRecordType<'_>) -> ExportResult<SpecExportPlan> {
        validate_options(&self.options)?;

        let l_descriptors = derive_field_descriptors(record_type)?;
        let column_map =
            plan_column_index_map(record_type.name, l_descriptors, self.options.n_fields_max)?;
        let constraints =
            plan_validation_constraints(column_map.descriptors(), &column_map, &self.options)?;

        debug!(
            type_name = record_type.name,
            n_cols = column_map.len(),
            n_constraints = constraints.len(),
            "planned export"
        );

        Ok(SpecExportPlan {
            type_name: record_type.name.to_string(),
            column_map,
            constraints,
        })
    }

    /// Export `source` laid out by `record_type` into xlsx bytes.
    pub fn export_to_buffer<S>(
        &self,
        record_type: &SpecRecordType<'_>,
        source: &S,
        sheet_name: &str,
    ) -> ExportResult<(Vec<u8>, SpecExportReport)>
    where
        S: RecordSource + ?Sized,
    {
        let (mut workbook, report) = self.build_workbook(record_type, source, sheet_name)?;
        let v_bytes = workbook.save_to_buffer()?;
        Ok((v_bytes, report))
    }

    /// Export `source` laid out by `record_type` into an xlsx file at `path`.
    pub fn export_to_path<S>(
        &self,
        record_type: &SpecRecordType<'_>,
        source: &S,
        sheet_name: &str,
        path: impl AsRef<Path>,
    ) -> ExportResult<SpecExportReport>
    where
        S: RecordSource + ?Sized,
    {
        let (v_bytes, report) = self.export_to_buffer(record_type, source, sheet_name)?;
        std::fs::write(path.as_ref(), v_bytes)?;
        Ok(report)
    }

    /// Export typed records using their own metadata.
    pub fn export_records<T: ExcelRecord>(
        &self,
        records: &[T],
        sheet_name: &str,
    ) -> ExportResult<(Vec<u8>, SpecExportReport)> {
        self.export_to_buffer(T::record_type(), &SpecRecordSlice::new(records), sheet_name)
    }

    /// Export a Polars IPC payload whose columns are named after fields.
    pub fn export_ipc_bytes(
        &self,
        record_type: &SpecRecordType<'_>,
        v_ipc_df: &[u8],
        sheet_name: &str,
    ) -> ExportResult<(Vec<u8>, SpecExportReport)> {
        let df = derive_dataframe_from_ipc_bytes(v_ipc_df)?;
        self.export_to_buffer(record_type, &df, sheet_name)
    }

    fn build_workbook<S>(
        &self,
        record_type: &SpecRecordType<'_>,
        source: &S,
        sheet_name: &str,
    ) -> ExportResult<(Workbook, SpecExportReport)>
    where
        S: RecordSource + ?Sized,
    {
        let plan = self.plan(record_type)?;
        let c_sheet_name = sanitize_sheet_name(sheet_name, "_");

        let mut report = SpecExportReport {
            sheet_name: c_sheet_name.clone(),
            n_cols_written: plan.column_map.len(),
            columns: plan.column_map.to_dict(),
            ..Default::default()
        };

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&c_sheet_name)?;

        self.write_header(worksheet, &plan.column_map)?;
        let n_rows_written = self.write_body(worksheet, &plan.column_map, source, &mut report)?;
        report.n_rows_written = n_rows_written;

        if let Some(n_row_freeze) = self.options.row_freeze {
            worksheet.set_freeze_panes(n_row_freeze, 0)?;
        }

        apply_validation_constraints(worksheet, &plan.constraints)?;
        report.constraints = plan.constraints;

        for c_warning in &report.warnings {
            warn!(type_name = record_type.name, "{c_warning}");
        }
        info!(
            type_name = record_type.name,
            sheet_name = %report.sheet_name,
            n_rows = report.n_rows_written,
            n_cols = report.n_cols_written,
            n_constraints = report.constraints.len(),
            "export finished"
        );

        Ok((workbook, report))
    }

    fn write_header(
        &self,
        worksheet: &mut Worksheet,
        column_map: &SpecColumnIndexMap,
    ) -> ExportResult<()> {
        let fmt_header = derive_rust_xlsx_format(&self.options.fmt_header);

        for (n_idx_col, descriptor) in column_map.iter_ordered() {
            let n_col = cast_col_num(n_idx_col)?;
            worksheet.write_string_with_format(0, n_col, &descriptor.label, &fmt_header)?;
            worksheet.set_column_width(
                n_col,
                descriptor.width.unwrap_or(self.options.width_cell_default),
            )?;
        }
        Ok(())
    }

    fn write_body<S>(
        &self,
        worksheet: &mut Worksheet,
        column_map: &SpecColumnIndexMap,
        source: &S,
        report: &mut SpecExportReport,
    ) -> ExportResult<usize>
    where
        S: RecordSource + ?Sized,
    {
        let fmt_text = derive_rust_xlsx_format(&self.options.fmt_text);
        let fmt_number = derive_rust_xlsx_format(&self.options.fmt_number);

        let mut l_dict_labels_by_col = Vec::with_capacity(column_map.len());
        for (n_idx_col, descriptor) in column_map.iter_ordered() {
            if !source.has_field(&descriptor.name) {
                report.warn(format!(
                    "Field {:?} (column {}) is missing from the record source; written blank.",
                    descriptor.name,
                    derive_column_letter(n_idx_col)
                ));
            }
            l_dict_labels_by_col.push(if self.options.if_replace_values {
                self.derive_value_to_label(descriptor)?
            } else {
                BTreeMap::new()
            });
        }

        let mut l_n_unmatched_by_col = vec![0usize; column_map.len()];
        let n_height = source.height();
        for n_row_local in 0..n_height {
            let n_row = cast_row_num(n_row_local + 1)?;
            for (n_idx_col, descriptor) in column_map.iter_ordered() {
                let mut value = source.cell_value(n_row_local, &descriptor.name)?;

                let dict_labels = &l_dict_labels_by_col[n_idx_col];
                if !dict_labels.is_empty()
                    && let Some(c_key) = value.to_replace_key()
                {
                    match dict_labels.get(&c_key) {
                        Some(c_label) => value = EnumCellValue::String(c_label.clone()),
                        None => l_n_unmatched_by_col[n_idx_col] += 1,
                    }
                }

                write_cell_with_format(
                    worksheet,
                    n_row,
                    cast_col_num(n_idx_col)?,
                    &value,
                    &fmt_text,
                    &fmt_number,
                )?;
            }
        }

        for (n_idx_col, descriptor) in column_map.iter_ordered() {
            let n_unmatched = l_n_unmatched_by_col[n_idx_col];
            if n_unmatched > 0 {
                report.warn(format!(
                    "Field {:?}: {n_unmatched} value(s) have no replacement label; written as-is.",
                    descriptor.name
                ));
            }
        }

        Ok(n_height)
    }

    fn derive_value_to_label(
        &self,
        descriptor: &SpecFieldDescriptor,
    ) -> ExportResult<BTreeMap<String, String>> {
        let mut dict_labels = BTreeMap::new();
        for entry in &descriptor.replacements {
            let rep = parse_replacement(
                entry,
                self.options.separator_replace,
                &descriptor.type_name,
                &descriptor.name,
            )?;
            dict_labels.entry(rep.value).or_insert(rep.label);
        }
        Ok(dict_labels)
    }
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    n_row: u32,
    n_col: u16,
    value: &EnumCellValue,
    fmt_text: &Format,
    fmt_number: &Format,
) -> ExportResult<()> {
    match value {
        EnumCellValue::None => {
            worksheet.write_blank(n_row, n_col, fmt_text)?;
        }
        EnumCellValue::String(val) => {
            worksheet.write_string_with_format(n_row, n_col, val, fmt_text)?;
        }
        EnumCellValue::Number(val) if val.is_finite() => {
            worksheet.write_number_with_format(n_row, n_col, *val, fmt_number)?;
        }
        EnumCellValue::Number(val) => {
            worksheet.write_string_with_format(n_row, n_col, val.to_string(), fmt_text)?;
        }
        EnumCellValue::Boolean(val) => {
            worksheet.write_boolean_with_format(n_row, n_col, *val, fmt_text)?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = &spec.bg_color {
        format = format.set_background_color(val.as_str());
    }
    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }
    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    match align.trim().to_ascii_lowercase().as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}
