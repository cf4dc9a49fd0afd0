//! Text and JSON reports of a rendered store.

use std::path::Path;

use lmdb_viz::{render_size, Frame, Summary};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub store: &'a Path,
    pub summary: &'a Summary,
    pub frame: FrameStats,
}

/// Frame statistics without the pixel buffer.
#[derive(Debug, Serialize)]
pub struct FrameStats {
    pub width: usize,
    pub height: usize,
    pub skip_offset: u64,
    pub end_offset: u64,
    pub bytes_per_pixel: u64,
    pub bytes_per_row: u64,
    pub status: String,
}

impl<'a> Report<'a> {
    pub fn new(store: &'a Path, summary: &'a Summary, frame: &Frame) -> Self {
        Self {
            store,
            summary,
            frame: FrameStats {
                width: frame.width,
                height: frame.height,
                skip_offset: frame.skip_offset,
                end_offset: frame.end_offset,
                bytes_per_pixel: frame.bytes_per_pixel,
                bytes_per_row: frame.bytes_per_row(),
                status: frame.status_line(&store_label(store)),
            },
        }
    }

    /// Human-readable table of space usage followed by the status line.
    pub fn to_text(&self) -> String {
        let summary = self.summary;
        let name_width = summary
            .tables
            .iter()
            .map(|table| table.name.chars().count())
            .max()
            .unwrap_or(0)
            .max("table".len());

        let mut out = String::new();
        out.push_str(&format!(
            "{:<name_width$}  {:>12} {:>7}  {:>12} {:>7}\n",
            "table", "keys", "%", "values", "%"
        ));
        for table in &summary.tables {
            out.push_str(&format!(
                "{:<name_width$}  {:>12} {:>6.2}%  {:>12} {:>6.2}%\n",
                table.name,
                render_size(table.key_bytes),
                table.key_percent,
                render_size(table.value_bytes),
                table.value_percent,
            ));
        }
        out.push('\n');
        out.push_str(&format!(
            "occupied: {}   file: {}   map: {}\n",
            render_size(summary.total_bytes),
            render_size(summary.file_size),
            render_size(summary.map_size),
        ));
        out.push_str(&self.frame.status);
        out.push('\n');
        out
    }
}

/// Short name of the store shown in the status line.
pub fn store_label(store: &Path) -> String {
    store
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| store.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lmdb_viz::{Color, ExtentIndex, RecordKind, Table};

    fn summary() -> Summary {
        let index = ExtentIndex::new(
            vec![Table {
                id: 0,
                name: "users".to_string(),
            }],
            vec![
                lmdb_viz::Extent {
                    table_id: 0,
                    kind: RecordKind::Key,
                    start: 0,
                    size: 512,
                    paired_offset: 512,
                },
                lmdb_viz::Extent {
                    table_id: 0,
                    kind: RecordKind::Value,
                    start: 512,
                    size: 1536,
                    paired_offset: 0,
                },
            ],
            8192,
            4096,
        )
        .unwrap();
        Summary::new(&index)
    }

    fn frame() -> Frame {
        Frame {
            width: 4,
            height: 1,
            pixels: vec![Color::FREE; 4],
            skip_offset: 0,
            end_offset: 3072,
            bytes_per_pixel: 1025,
        }
    }

    #[test]
    fn test_text_report() {
        let summary = summary();
        let report = Report::new(Path::new("/data/mystore"), &summary, &frame());
        let text = report.to_text();

        assert!(text.contains("users"));
        assert!(text.contains("512 b"));
        assert!(text.contains("1.50 K"));
        assert!(text.contains("25.00%"));
        assert!(text.contains("75.00%"));
        assert!(text.contains("occupied: 2.00 K   file: 4.00 K   map: 8.00 K"));
        assert!(text.ends_with("DB: mystore   0 b - 3.00 K   (row: 4.00 K, pixel: 1.00 K)\n"));
    }

    #[test]
    fn test_json_report() {
        let summary = summary();
        let report = Report::new(Path::new("/data/mystore"), &summary, &frame());
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["store"], "/data/mystore");
        assert_eq!(json["summary"]["total_bytes"], 2048);
        assert_eq!(json["summary"]["tables"][0]["name"], "users");
        assert_eq!(json["frame"]["end_offset"], 3072);
        assert_eq!(json["frame"]["bytes_per_row"], 4100);
        assert!(json["frame"].get("pixels").is_none());
    }

    #[test]
    fn test_store_label() {
        assert_eq!(store_label(Path::new("/var/db/cache")), "cache");
        assert_eq!(store_label(Path::new("/")), "/");
    }
}
