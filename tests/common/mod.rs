#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}

/// A raw export exercising every structural defect the repair pass handles:
/// a junk row before the header, merge-conflict lines, sentinel cells, and a
/// row whose total has to be recovered or zero-filled.
pub fn messy_export() -> String {
    [
        "POS EXPORT v2.1",
        "Transaction Date,Item,Quantity,Price Per Unit,Total Spent,Payment Method,Location",
        "2024-03-01,Latte,2,4.5,9.0,Card,Downtown",
        "<<<<<<< HEAD",
        "2024-03-01,Mocha,3,2.5,ERROR,Cash,UNKNOWN",
        "=======",
        "2024-03-02,Latte,1,4.5,4.5,Card,Airport",
        ">>>>>>> theirs",
        "2024-03-03,Tea,nan,3.0,,Card,Downtown",
        "",
    ]
    .join("\n")
}

/// Fifty rows whose totals are exact quantity-times-price products.
pub fn consistent_export(rows: usize) -> String {
    let mut contents = String::from(
        "Transaction Date,Item,Quantity,Price Per Unit,Total Spent,Payment Method,Location\n",
    );
    for i in 0..rows {
        let quantity = (i % 10 + 1) as f64;
        let price = 2.0 + (i % 7) as f64 * 0.5;
        contents.push_str(&format!(
            "2024-03-01,Latte,{quantity},{price},{total},Card,Downtown\n",
            total = quantity * price
        ));
    }
    contents
}
