//! # Exporter
//!
//! File output for scan buffers: CSV tables and ASCII PLY point clouds.
//! The engine hands buffers over verbatim; all formatting lives here.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{debug, error};

use contracts::{Exporter, Point3, ScanError};

/// Exporter writing CSV tables and PLY point clouds to disk.
#[derive(Debug, Default)]
pub struct FileExporter;

impl FileExporter {
    pub fn new() -> Self {
        Self
    }

    fn create(&self, path: &Path) -> std::io::Result<BufWriter<File>> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(BufWriter::new(File::create(path)?))
    }

    fn write_table(&self, points: &[Point3], path: &Path) -> std::io::Result<()> {
        let mut file = self.create(path)?;
        writeln!(file, "x,y,z,azimuth,elevation,roll")?;
        for point in points {
            writeln!(
                file,
                "{},{},{},{},{},{}",
                point.x, point.y, point.z, point.azimuth, point.elevation, point.roll
            )?;
        }
        file.flush()
    }

    fn write_point_cloud(&self, points: &[Point3], path: &Path) -> std::io::Result<()> {
        let mut file = self.create(path)?;
        // ASCII PLY header
        writeln!(file, "ply")?;
        writeln!(file, "format ascii 1.0")?;
        writeln!(file, "element vertex {}", points.len())?;
        writeln!(file, "property float x")?;
        writeln!(file, "property float y")?;
        writeln!(file, "property float z")?;
        writeln!(file, "end_header")?;
        for point in points {
            writeln!(file, "{} {} {}", point.x, point.y, point.z)?;
        }
        file.flush()
    }

    fn persist(
        &self,
        label: &str,
        path: &Path,
        result: std::io::Result<()>,
    ) -> Result<(), ScanError> {
        result.map_err(|e| {
            error!(path = %path.display(), error = %e, "export write failed");
            ScanError::export(format!("{label} write to {} failed: {e}", path.display()))
        })?;
        debug!(path = %path.display(), "{label} written");
        Ok(())
    }
}

impl Exporter for FileExporter {
    async fn export_table(&mut self, points: &[Point3], path: &Path) -> Result<(), ScanError> {
        self.persist("table", path, self.write_table(points, path))
    }

    async fn export_point_cloud(
        &mut self,
        points: &[Point3],
        path: &Path,
    ) -> Result<(), ScanError> {
        self.persist("point cloud", path, self.write_point_cloud(points, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_points() -> Vec<Point3> {
        vec![
            Point3::new(1.0, 2.0, 3.0, 10.0, 20.0, 30.0),
            Point3::new(-1.5, 0.0, 4.25, 0.0, 0.0, 0.0),
        ]
    }

    #[tokio::test]
    async fn test_export_table_writes_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scan.csv");

        let mut exporter = FileExporter::new();
        exporter
            .export_table(&sample_points(), &path)
            .await
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "x,y,z,azimuth,elevation,roll");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "1,2,3,10,20,30");
    }

    #[tokio::test]
    async fn test_export_point_cloud_writes_ply() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cloud.ply");

        let mut exporter = FileExporter::new();
        exporter
            .export_point_cloud(&sample_points(), &path)
            .await
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines[0], "ply");
        assert_eq!(lines[1], "format ascii 1.0");
        assert_eq!(lines[2], "element vertex 2");
        assert_eq!(lines[6], "end_header");
        assert_eq!(lines[7], "1 2 3");
        assert_eq!(lines.len(), 9);
    }

    #[tokio::test]
    async fn test_export_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/scan.csv");

        let mut exporter = FileExporter::new();
        exporter
            .export_table(&sample_points(), &path)
            .await
            .unwrap();
        assert!(path.exists());
    }
}
