use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};

/// Write synthetic DBT.xlsx, 5A.xlsx and R234.xlsx in the layouts gene-overlap expects.
#[derive(Parser, Debug)]
#[command(about, long_about = None)]
struct Args {
    /// Output directory
    #[arg(default_value = ".")]
    out_dir: PathBuf,

    /// PRNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    /// Pick `n` distinct indices below `len`, sorted.
    fn sample(&mut self, len: usize, n: usize) -> Vec<usize> {
        let mut picked = BTreeSet::new();
        while picked.len() < n.min(len) {
            picked.insert((self.next_u64() % len as u64) as usize);
        }
        picked.into_iter().collect()
    }
}

/// Column positions of one sheet layout.
struct Layout {
    header: &'static [&'static str],
    gene: u16,
    log2fc: u16,
    padj: u16,
}

const DESEQ_LAYOUT: Layout = Layout {
    header: &["id", "chr", "gene", "baseMean", "log2FoldChange", "padj"],
    gene: 2,
    log2fc: 4,
    padj: 5,
};

const R234_LAYOUT: Layout = Layout {
    header: &["id", "chr", "gene", "baseMean", "lfcSE", "log2FoldChange", "padj"],
    gene: 2,
    log2fc: 5,
    padj: 6,
};

/// Fraction of rows written with an `NA` gene.
const NA_RATE: f64 = 0.05;

fn write_results(
    worksheet: &mut Worksheet,
    title: Option<&str>,
    layout: &Layout,
    genes: &[String],
    rng: &mut SimpleRng,
) -> Result<(), XlsxError> {
    let mut row: u32 = 0;
    if let Some(title) = title {
        worksheet.write_string(row, 0, title)?;
        row += 1;
    }
    for (col, name) in layout.header.iter().enumerate() {
        worksheet.write_string(row, col as u16, *name)?;
    }
    row += 1;

    for (i, gene) in genes.iter().enumerate() {
        worksheet.write_number(row, 0, (i + 1) as f64)?;
        worksheet.write_string(row, 1, format!("chr{}", 1 + rng.next_u64() % 22))?;
        if rng.next_f64() < NA_RATE {
            worksheet.write_string(row, layout.gene, "NA")?;
        } else {
            worksheet.write_string(row, layout.gene, gene)?;
        }
        worksheet.write_number(row, 3, (rng.next_f64() * 5000.0).round())?;
        if layout.log2fc > 4 {
            worksheet.write_number(row, 4, rng.next_f64() * 0.5)?;
        }
        worksheet.write_number(row, layout.log2fc, rng.gauss(0.0, 2.0))?;
        worksheet.write_number(row, layout.padj, rng.next_f64() * 0.05)?;
        row += 1;
    }
    Ok(())
}

fn pick(pool: &[String], indices: &[usize]) -> Vec<String> {
    indices.iter().map(|&i| pool[i].clone()).collect()
}

fn save(workbook: &mut Workbook, path: &Path) -> Result<()> {
    workbook
        .save(path)
        .with_context(|| format!("writing {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;

    let pool: Vec<String> = (1..=2000).map(|i| format!("GENE{i:04}")).collect();

    // DBT: one sheet, a title row above the header.
    let dbt_genes = pick(&pool, &rng.sample(pool.len(), 800));
    let mut dbt = Workbook::new();
    write_results(
        dbt.add_worksheet(),
        Some("DBT vs control"),
        &DESEQ_LAYOUT,
        &dbt_genes,
        &mut rng,
    )?;
    save(&mut dbt, &args.out_dir.join("DBT.xlsx"))?;

    // 5A: one sheet, header on the first row.
    let drug5a_genes = pick(&pool, &rng.sample(pool.len(), 700));
    let mut drug5a = Workbook::new();
    write_results(drug5a.add_worksheet(), None, &DESEQ_LAYOUT, &drug5a_genes, &mut rng)?;
    save(&mut drug5a, &args.out_dir.join("5A.xlsx"))?;

    // R234: results split across sheets 3 and 4, behind two summary sheets.
    let mut r234 = Workbook::new();
    for title in ["Summary", "QC"] {
        r234.add_worksheet().write_string(0, 0, title)?;
    }
    let mut r234_rows = 0;
    for title in ["R234 up-regulated", "R234 down-regulated"] {
        let genes = pick(&pool, &rng.sample(pool.len(), 400));
        r234_rows += genes.len();
        write_results(r234.add_worksheet(), Some(title), &R234_LAYOUT, &genes, &mut rng)?;
    }
    save(&mut r234, &args.out_dir.join("R234.xlsx"))?;

    println!(
        "Wrote DBT ({} rows), 5A ({} rows) and R234 ({} rows) to {}",
        dbt_genes.len(),
        drug5a_genes.len(),
        r234_rows,
        args.out_dir.display()
    );
    Ok(())
}
