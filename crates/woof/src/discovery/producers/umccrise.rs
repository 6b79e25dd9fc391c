//! umccrise: one directory per sample, result files grouped by variant class

use super::{directory_name, DataSource, ProducerDescriptor};
use crate::discovery::error::Result;
use crate::discovery::types::DataType;

pub const ID: &str = "umccrise";

const THRESHOLD: u32 = 30;

const FINGERPRINT: &[(&str, u32)] = &[
    ("small_variants$", 10),
    ("structural$", 10),
    ("purple$", 10),
    (".+_cancer_report.html$", 5),
    ("coverage$", 5),
    ("log/data_versions.txt$", 5),
    ("oncoviruses$", 5),
    ("pierian$", 5),
    (".+-multiqc_report.html$", 2),
    (".+-multiqc_report_data$", 2),
    (".+-normal.cacao.html$", 2),
    (".+-normal.cpsr.html$", 2),
    (".+-somatic.pcgr.html$", 2),
    (".+-tumor.cacao.html$", 2),
    ("cancer_report_tables$", 2),
];

/// Scratch directories under `umccrised/` hold intermediate copies of sample
/// output and would otherwise be claimed as extra samples.
const SCRATCH_PATHS: &[&str] = &[
    r"^.+/umccrised/log(?:/.*)?$",
    r"^.+/umccrised/work(?:/.*)?$",
    r"^.+/umccrised/benchmarks(?:/.*)?$",
    r"^.+/umccrised/\.snakemake(?:/.*)?$",
];

pub fn descriptor() -> Result<ProducerDescriptor> {
    let mut producer = ProducerDescriptor::new(ID, "UMCCRISE", THRESHOLD, directory_name())
        .data_source(DataSource::new(
            "cpsr",
            "CPSR",
            DataType::SmallVariants,
            "small_variants/.+-germline.predispose_genes.vcf.gz$",
        )?)
        .data_source(DataSource::new(
            "pcgr",
            "PCGR",
            DataType::SmallVariants,
            "small_variants/.+somatic-PASS.vcf.gz$",
        )?)
        .data_source(DataSource::new(
            "manta",
            "Manta",
            DataType::StructuralVariants,
            "structural/.+-manta.vcf.gz$",
        )?)
        .data_source(DataSource::new(
            "purple",
            "PURPLE",
            DataType::CopyNumberVariants,
            "purple/.+.purple.cnv.gene.tsv$",
        )?);

    for (pattern, weight) in FINGERPRINT {
        producer = producer.fingerprint(pattern, *weight)?;
    }
    for pattern in SCRATCH_PATHS {
        producer = producer.exclude(pattern)?;
    }
    Ok(producer)
}
