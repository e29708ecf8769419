//! VCF record model, reader and writer
//!
//! The `##` metadata block is kept as opaque text and round-trips byte for
//! byte. The `#CHROM` header names the columns, and every data line becomes a
//! [`VariantRecord`] holding one raw string per header column.

use crate::core::{NormalizeError, Result};
use crate::core::io::{open_input, trim_line_end, AtomicOutput, LineIterator};
use log::{debug, warn};
use memchr::memchr_iter;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Columns every VCF header starts with, in order
pub const MANDATORY_COLUMNS: [&str; 8] = ["CHROM", "POS", "ID", "REF", "ALT", "QUAL", "FILTER", "INFO"];

/// Name of the optional ninth column
pub const FORMAT_COLUMN: &str = "FORMAT";

pub const COL_CHROM: usize = 0;
pub const COL_POS: usize = 1;
pub const COL_REF: usize = 3;
pub const COL_ALT: usize = 4;
pub const COL_FILTER: usize = 6;
pub const COL_INFO: usize = 7;
pub const COL_FORMAT: usize = 8;
pub const FIRST_SAMPLE: usize = 9;

/// Missing-value sentinel
pub const MISSING: &str = ".";

/// Verbatim `##` lines, terminators included
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataBlock {
    text: String,
}

impl MetadataBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one raw line, terminator included
    pub fn push_line(&mut self, raw: &str) {
        self.text.push_str(raw);
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Metadata lines without terminators
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }
}

/// Column names from the `#CHROM` line (stored without the leading `#`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    columns: Vec<String>,
    line: usize,
}

impl Header {
    /// Parse a `#CHROM` line (terminator already stripped)
    pub fn parse(line: &str, line_no: usize) -> Result<Self> {
        let body = line
            .strip_prefix('#')
            .ok_or_else(|| NormalizeError::malformed(line_no, "header line must start with '#'"))?;
        let columns: Vec<String> = split_fields(body).into_iter().map(str::to_string).collect();
        Self::from_columns(columns, line_no)
    }

    /// Build a header from column names, validating the fixed layout
    pub fn from_columns(columns: Vec<String>, line_no: usize) -> Result<Self> {
        if columns.len() < MANDATORY_COLUMNS.len() {
            return Err(NormalizeError::malformed(
                line_no,
                format!(
                    "header has {} columns, expected at least {}",
                    columns.len(),
                    MANDATORY_COLUMNS.len()
                ),
            ));
        }

        for (i, expected) in MANDATORY_COLUMNS.iter().enumerate() {
            if columns[i] != *expected {
                return Err(NormalizeError::malformed(
                    line_no,
                    format!("header column {} is '{}', expected '{}'", i + 1, columns[i], expected),
                ));
            }
        }

        if columns.len() > COL_FORMAT && columns[COL_FORMAT] != FORMAT_COLUMN {
            return Err(NormalizeError::malformed(
                line_no,
                format!("header column 9 is '{}', expected 'FORMAT'", columns[COL_FORMAT]),
            ));
        }

        Ok(Self {
            columns,
            line: line_no,
        })
    }

    /// 1-based line number of the `#CHROM` line
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn has_format(&self) -> bool {
        self.columns.len() > COL_FORMAT
    }

    /// Position of a named column
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Sample column names (everything after FORMAT)
    pub fn sample_names(&self) -> &[String] {
        if self.columns.len() > FIRST_SAMPLE {
            &self.columns[FIRST_SAMPLE..]
        } else {
            &[]
        }
    }

    /// Render as a `#CHROM` line without terminator
    pub fn to_line(&self) -> String {
        format!("#{}", self.columns.join("\t"))
    }
}

/// One data row: raw field strings aligned with the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRecord {
    line: usize,
    fields: Vec<String>,
}

impl VariantRecord {
    /// Split a data line into fields aligned with `header`
    ///
    /// Extra trailing fields are discarded; missing fields are an error.
    pub fn parse(line: &str, header: &Header, line_no: usize) -> Result<Self> {
        let mut fields = split_fields(line);

        if fields.len() < header.len() {
            return Err(NormalizeError::malformed(
                line_no,
                format!("expected {} fields, found {}", header.len(), fields.len()),
            ));
        }
        if fields.len() > header.len() {
            warn!(
                "line {}: discarding {} field(s) beyond the {} header columns",
                line_no,
                fields.len() - header.len(),
                header.len()
            );
            fields.truncate(header.len());
        }

        Ok(Self {
            line: line_no,
            fields: fields.into_iter().map(str::to_string).collect(),
        })
    }

    /// 1-based source line number
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }

    /// Look a field up by column name
    pub fn get<'a>(&'a self, header: &Header, name: &str) -> Option<&'a str> {
        header.index_of(name).and_then(|i| self.field(i))
    }

    pub fn chrom(&self) -> &str {
        &self.fields[COL_CHROM]
    }

    pub fn pos(&self) -> &str {
        &self.fields[COL_POS]
    }

    pub fn ref_allele(&self) -> &str {
        &self.fields[COL_REF]
    }

    pub fn alt(&self) -> &str {
        &self.fields[COL_ALT]
    }

    pub fn filter(&self) -> &str {
        &self.fields[COL_FILTER]
    }

    pub fn info(&self) -> &str {
        &self.fields[COL_INFO]
    }

    /// FORMAT column, absent in sites-only files
    pub fn format(&self) -> Option<&str> {
        self.field(COL_FORMAT)
    }

    pub fn samples(&self) -> &[String] {
        if self.fields.len() > FIRST_SAMPLE {
            &self.fields[FIRST_SAMPLE..]
        } else {
            &[]
        }
    }

    /// Replace the INFO column
    pub fn with_info(mut self, info: String) -> Self {
        self.fields[COL_INFO] = info;
        self
    }

    /// Replace FORMAT and all sample columns; the sample count must not change
    pub fn with_format_and_samples(mut self, format: String, samples: Vec<String>) -> Self {
        debug_assert_eq!(samples.len(), self.samples().len());
        if self.fields.len() > COL_FORMAT {
            self.fields[COL_FORMAT] = format;
            self.fields.truncate(FIRST_SAMPLE);
            self.fields.extend(samples);
        }
        self
    }

    /// Render as a tab-joined line without terminator
    pub fn to_line(&self) -> String {
        self.fields.join("\t")
    }
}

/// Header plus ordered records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantTable {
    header: Header,
    records: Vec<VariantRecord>,
}

impl VariantTable {
    pub fn new(header: Header, records: Vec<VariantRecord>) -> Self {
        Self { header, records }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn records(&self) -> &[VariantRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Stable selection; returns the new table and the number of dropped rows
    pub fn select<F>(self, mut keep: F) -> (Self, usize)
    where
        F: FnMut(&VariantRecord) -> bool,
    {
        let before = self.records.len();
        let mut records = self.records;
        records.retain(|r| keep(r));
        let dropped = before - records.len();
        (Self::new(self.header, records), dropped)
    }

    /// Rewrite every record in order, stopping at the first error
    pub fn try_map<F>(self, mut f: F) -> Result<Self>
    where
        F: FnMut(&Header, VariantRecord) -> Result<VariantRecord>,
    {
        let header = self.header;
        let records = self
            .records
            .into_iter()
            .map(|r| f(&header, r))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(header, records))
    }
}

/// A whole VCF file: metadata and table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcfDocument {
    pub metadata: MetadataBlock,
    pub table: VariantTable,
}

/// Split on tab characters
pub fn split_fields(line: &str) -> Vec<&str> {
    let bytes = line.as_bytes();
    let mut fields = Vec::with_capacity(10);
    let mut start = 0;
    for tab in memchr_iter(b'\t', bytes) {
        fields.push(&line[start..tab]);
        start = tab + 1;
    }
    fields.push(&line[start..]);
    fields
}

/// Read a VCF file from disk (plain, gzip or bzip2)
pub fn read_vcf<P: AsRef<Path>>(path: P) -> Result<VcfDocument> {
    let path = path.as_ref();
    debug!("Reading VCF file: {:?}", path);
    let reader = open_input(path)?;
    read_vcf_from(reader)
}

/// Read a VCF document from any buffered reader
pub fn read_vcf_from<R: BufRead>(reader: R) -> Result<VcfDocument> {
    let mut lines = LineIterator::new(reader);
    let mut metadata = MetadataBlock::new();
    let mut header: Option<Header> = None;
    let mut records = Vec::new();

    while let Some(raw) = lines.next_line() {
        let (line_no, raw) = raw?;
        let line = trim_line_end(raw);

        if line.trim().is_empty() {
            continue;
        }

        if line.starts_with("#CHROM") {
            if header.is_some() {
                return Err(NormalizeError::malformed(line_no, "duplicate #CHROM header line"));
            }
            header = Some(Header::parse(line, line_no)?);
            continue;
        }

        if line.starts_with('#') {
            if header.is_some() {
                return Err(NormalizeError::malformed(
                    line_no,
                    "metadata line after the #CHROM header",
                ));
            }
            if !line.starts_with("##") {
                warn!("line {}: keeping single-'#' line as metadata", line_no);
            }
            metadata.push_line(raw);
            continue;
        }

        let header = header.as_ref().ok_or_else(|| {
            NormalizeError::malformed(line_no, "data line before the #CHROM header")
        })?;
        records.push(VariantRecord::parse(line, header, line_no)?);
    }

    let header = header.ok_or_else(|| {
        NormalizeError::malformed(lines.line_no(), "no #CHROM header line found")
    })?;

    debug!("Read {} metadata bytes, {} records", metadata.as_str().len(), records.len());

    Ok(VcfDocument {
        metadata,
        table: VariantTable::new(header, records),
    })
}

/// Serialize a document: metadata verbatim, header, one line per record
pub fn write_vcf_to<W: Write>(doc: &VcfDocument, writer: &mut W) -> io::Result<()> {
    let metadata = doc.metadata.as_str();
    writer.write_all(metadata.as_bytes())?;
    if !metadata.is_empty() && !metadata.ends_with('\n') {
        writer.write_all(b"\n")?;
    }

    writeln!(writer, "{}", doc.table.header().to_line())?;
    for record in doc.table.records() {
        writeln!(writer, "{}", record.to_line())?;
    }
    writer.flush()
}

/// Write a document to disk atomically (`.gz` paths are compressed)
pub fn write_vcf<P: AsRef<Path>>(doc: &VcfDocument, path: P) -> Result<()> {
    let path = path.as_ref();
    debug!("Writing VCF file: {:?}", path);

    let mut output = AtomicOutput::create(path)?;
    write_vcf_to(doc, &mut output).map_err(|source| NormalizeError::OutputWrite {
        path: path.to_path_buf(),
        source,
    })?;
    output.commit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA12878";

    fn header() -> Header {
        Header::parse(HEADER, 1).unwrap()
    }

    #[test]
    fn test_header_parse() {
        let header = header();
        assert_eq!(header.len(), 10);
        assert!(header.has_format());
        assert_eq!(header.sample_names(), ["NA12878".to_string()]);
        assert_eq!(header.index_of("FILTER"), Some(COL_FILTER));
        assert_eq!(header.to_line(), HEADER);
    }

    #[test]
    fn test_header_sites_only() {
        let header = Header::parse("#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO", 1).unwrap();
        assert!(!header.has_format());
        assert!(header.sample_names().is_empty());
    }

    #[test]
    fn test_header_rejects_wrong_columns() {
        let result = Header::parse("#CHROM\tPOS\tID\tALT\tREF\tQUAL\tFILTER\tINFO", 4);
        assert!(matches!(result, Err(NormalizeError::MalformedInput { line: 4, .. })));

        let result = Header::parse("#CHROM\tPOS\tID", 1);
        assert!(result.is_err());

        let result = Header::parse("#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFMT\tS1", 1);
        assert!(result.is_err());
    }

    #[test]
    fn test_record_parse_and_accessors() {
        let line = "chr1\t917495\trs13303369\tC\tT\t655\tPASS\tAF1000G=0.49\tGT:DP\t1/1:51";
        let record = VariantRecord::parse(line, &header(), 7).unwrap();

        assert_eq!(record.line(), 7);
        assert_eq!(record.chrom(), "chr1");
        assert_eq!(record.pos(), "917495");
        assert_eq!(record.ref_allele(), "C");
        assert_eq!(record.alt(), "T");
        assert_eq!(record.filter(), "PASS");
        assert_eq!(record.info(), "AF1000G=0.49");
        assert_eq!(record.format(), Some("GT:DP"));
        assert_eq!(record.samples(), ["1/1:51".to_string()]);
        assert_eq!(record.get(&header(), "NA12878"), Some("1/1:51"));
        assert_eq!(record.to_line(), line);
    }

    #[test]
    fn test_record_extra_fields_truncated() {
        let line = "chr1\t1\t.\tA\tG\t.\tPASS\t.\tGT\t0/1\textra\tmore";
        let record = VariantRecord::parse(line, &header(), 2).unwrap();
        assert_eq!(record.fields().len(), 10);
        assert_eq!(record.samples(), ["0/1".to_string()]);
    }

    #[test]
    fn test_record_too_few_fields() {
        let result = VariantRecord::parse("chr1\t1\t.\tA\tG", &header(), 5);
        assert!(matches!(result, Err(NormalizeError::MalformedInput { line: 5, .. })));
    }

    #[test]
    fn test_split_fields_keeps_empty() {
        assert_eq!(split_fields("a\t\tb\t"), vec!["a", "", "b", ""]);
        assert_eq!(split_fields(""), vec![""]);
    }

    #[test]
    fn test_read_document() {
        let text = format!(
            "##fileformat=VCFv4.1\n##source=test\n{}\n\nchr1\t1\t.\tA\tG\t.\tPASS\t.\tGT\t0/1\n",
            HEADER
        );
        let doc = read_vcf_from(Cursor::new(text)).unwrap();

        assert_eq!(doc.metadata.as_str(), "##fileformat=VCFv4.1\n##source=test\n");
        assert_eq!(doc.metadata.lines().count(), 2);
        assert_eq!(doc.table.len(), 1);
        assert_eq!(doc.table.records()[0].line(), 5);
    }

    #[test]
    fn test_read_crlf() {
        let text = format!("##fileformat=VCFv4.1\r\n{}\r\nchr1\t1\t.\tA\tG\t.\tPASS\t.\tGT\t0/1\r\n", HEADER);
        let doc = read_vcf_from(Cursor::new(text)).unwrap();

        assert_eq!(doc.metadata.as_str(), "##fileformat=VCFv4.1\r\n");
        assert_eq!(doc.table.header().sample_names(), ["NA12878".to_string()]);
        assert_eq!(doc.table.records()[0].samples(), ["0/1".to_string()]);
    }

    #[test]
    fn test_read_missing_header() {
        let result = read_vcf_from(Cursor::new("##fileformat=VCFv4.1\n"));
        assert!(matches!(result, Err(NormalizeError::MalformedInput { .. })));

        let result = read_vcf_from(Cursor::new("chr1\t1\t.\tA\tG\t.\tPASS\t.\n"));
        assert!(matches!(result, Err(NormalizeError::MalformedInput { line: 1, .. })));
    }

    #[test]
    fn test_read_duplicate_header() {
        let text = format!("{}\n{}\n", HEADER, HEADER);
        let result = read_vcf_from(Cursor::new(text));
        assert!(matches!(result, Err(NormalizeError::MalformedInput { line: 2, .. })));
    }

    #[test]
    fn test_read_metadata_after_header() {
        let text = format!("{}\n##late=1\n", HEADER);
        assert!(read_vcf_from(Cursor::new(text)).is_err());
    }

    #[test]
    fn test_write_document() {
        let text = format!(
            "##fileformat=VCFv4.1\n{}\nchr1\t1\t.\tA\tG\t.\tPASS\t.\tGT\t0/1\n",
            HEADER
        );
        let doc = read_vcf_from(Cursor::new(text.clone())).unwrap();

        let mut out = Vec::new();
        write_vcf_to(&doc, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), text);
    }

    #[test]
    fn test_write_header_only() {
        let text = format!("##fileformat=VCFv4.1\n{}\n", HEADER);
        let doc = read_vcf_from(Cursor::new(text.clone())).unwrap();
        assert!(doc.table.is_empty());

        let mut out = Vec::new();
        write_vcf_to(&doc, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), text);
    }

    #[test]
    fn test_with_format_and_samples() {
        let line = "chr1\t1\t.\tA\tG\t.\tPASS\t.\tGT:GQ:DP\t0/1:30:12";
        let record = VariantRecord::parse(line, &header(), 1).unwrap();
        let record = record.with_format_and_samples("GT:DP".to_string(), vec!["0/1:12".to_string()]);
        assert_eq!(record.format(), Some("GT:DP"));
        assert_eq!(record.samples(), ["0/1:12".to_string()]);
        assert_eq!(record.fields().len(), 10);
    }
}
