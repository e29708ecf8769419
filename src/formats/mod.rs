//! File format adapters
//!
//! Only VCF is handled: record model, reader and writer.

pub mod vcf;

pub use vcf::{
    read_vcf, read_vcf_from, write_vcf, write_vcf_to, Header, MetadataBlock, VariantRecord,
    VariantTable, VcfDocument,
};
