//! STL file loading for shielding solids.
//!
//! Both binary and ASCII STL are supported; the variant is detected from
//! the buffer itself. Vertices are converted to millimeters via the input
//! unit and user scale, then pose-transformed, before the mesh metrics
//! are derived.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Point;
use crate::Triangle;
use crate::error::{Error, Result};
use crate::geom::mesh::MeshGeometry;
use crate::geom::rotation::Pose;

/// STL file format variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StlFormat {
    /// ASCII text format (human-readable, larger file size)
    Ascii,
    /// Binary format (compact, faster to read/write)
    Binary,
}

/// Length unit of the STL coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnit {
    Mm,
    Cm,
    M,
    Inch,
}

impl LengthUnit {
    /// Multiplier converting this unit to millimeters.
    pub fn to_mm(self) -> f64 {
        match self {
            LengthUnit::Mm => 1.0,
            LengthUnit::Cm => 10.0,
            LengthUnit::M => 1000.0,
            LengthUnit::Inch => 25.4,
        }
    }
}

impl FromStr for LengthUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mm" => Ok(LengthUnit::Mm),
            "cm" => Ok(LengthUnit::Cm),
            "m" => Ok(LengthUnit::M),
            "inch" => Ok(LengthUnit::Inch),
            other => Err(Error::UnsupportedUnit(other.to_string())),
        }
    }
}

/// Mesh ingestion options; mirrors the `geometry.mesh` block of a
/// project configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshConfig {
    /// Path to the STL file.
    pub path: String,
    /// Unit of the raw STL coordinates.
    pub input_unit: LengthUnit,
    /// Extra user scale applied on top of the unit conversion. Must be > 0.
    pub scale_to_mm: f64,
    /// Optional rigid-body transform applied to every vertex.
    #[serde(default)]
    pub pose: Pose,
    /// Reject meshes that are not closed 2-manifolds. Default: true.
    pub watertight_required: bool,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            input_unit: LengthUnit::Mm,
            scale_to_mm: 1.0,
            pose: Pose::identity(),
            watertight_required: true,
        }
    }
}

/// Loads an STL file and derives the mesh metrics.
///
/// Fails fast on an invalid scale before touching the file. When
/// `watertight_required` is set and the mesh has open or non-manifold
/// edges, the load fails with [`Error::NonWatertightMesh`]; otherwise the
/// verdict is only recorded on the returned mesh.
pub fn load_stl(config: &MeshConfig) -> Result<MeshGeometry> {
    if !(config.scale_to_mm > 0.0) || !config.scale_to_mm.is_finite() {
        return Err(Error::InvalidScale(config.scale_to_mm));
    }
    let scale = config.input_unit.to_mm() * config.scale_to_mm;

    let path = Path::new(&config.path);
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    let buffer = fs::read(path)?;

    let raw = if detect_binary(&buffer) {
        parse_binary(&buffer)?
    } else {
        parse_ascii(&buffer)?
    };

    let triangles: Vec<Triangle> = raw
        .into_iter()
        .map(|tri| {
            Triangle::new(
                config.pose.apply(tri.a.scale(scale)),
                config.pose.apply(tri.b.scale(scale)),
                config.pose.apply(tri.c.scale(scale)),
            )
        })
        .collect();

    let mesh = MeshGeometry::from_triangles(triangles)?;
    if config.watertight_required && !mesh.is_watertight() {
        return Err(Error::NonWatertightMesh);
    }
    Ok(mesh)
}

/// Binary if the declared triangle count matches the file length exactly;
/// otherwise a header starting with "solid" indicates ASCII. Anything
/// else defaults to binary.
fn detect_binary(buffer: &[u8]) -> bool {
    if buffer.len() < 84 {
        return false;
    }
    let count = u32::from_le_bytes([buffer[80], buffer[81], buffer[82], buffer[83]]) as usize;
    if 84 + count * 50 == buffer.len() {
        return true;
    }
    let header = String::from_utf8_lossy(&buffer[..80]);
    !header.trim().to_lowercase().starts_with("solid")
}

fn parse_ascii(buffer: &[u8]) -> Result<Vec<Triangle>> {
    let text = String::from_utf8_lossy(buffer);

    let mut vertices: Vec<Point> = Vec::new();
    let mut tokens = text.split_whitespace();
    while let Some(token) = tokens.next() {
        if !token.eq_ignore_ascii_case("vertex") {
            continue;
        }
        let mut coords = [0.0_f64; 3];
        for c in coords.iter_mut() {
            let word = tokens.next().ok_or_else(|| {
                Error::InvalidFormat("truncated vertex line in ASCII STL".to_string())
            })?;
            *c = word.parse::<f64>().map_err(|_| {
                Error::InvalidFormat(format!("invalid vertex coordinate: '{word}'"))
            })?;
        }
        vertices.push(Point::new(coords[0], coords[1], coords[2]));
    }

    if vertices.is_empty() || vertices.len() % 3 != 0 {
        return Err(Error::InvalidFormat(
            "vertex count is not a triangle multiple".to_string(),
        ));
    }

    Ok(vertices
        .chunks_exact(3)
        .map(|v| Triangle::new(v[0], v[1], v[2]))
        .collect())
}

fn parse_binary(buffer: &[u8]) -> Result<Vec<Triangle>> {
    if buffer.len() < 84 {
        return Err(Error::InvalidFormat("binary STL shorter than header".to_string()));
    }
    let count = u32::from_le_bytes([buffer[80], buffer[81], buffer[82], buffer[83]]) as usize;
    if buffer.len() < 84 + count * 50 {
        return Err(Error::InvalidFormat("invalid binary STL length".to_string()));
    }

    let read_f32 = |off: usize| -> f64 {
        f32::from_le_bytes([buffer[off], buffer[off + 1], buffer[off + 2], buffer[off + 3]]) as f64
    };
    let read_vertex = |off: usize| Point::new(read_f32(off), read_f32(off + 4), read_f32(off + 8));

    let mut triangles = Vec::with_capacity(count);
    for i in 0..count {
        let off = 84 + i * 50 + 12; // skip the 12-byte normal
        triangles.push(Triangle::new(
            read_vertex(off),
            read_vertex(off + 12),
            read_vertex(off + 24),
        ));
    }
    Ok(triangles)
}

/// Writes triangles to an STL file. Used for fixtures and exports.
pub fn write_stl(path: &Path, triangles: &[Triangle], name: &str, format: StlFormat) -> Result<()> {
    match format {
        StlFormat::Ascii => write_stl_ascii(path, triangles, name),
        StlFormat::Binary => write_stl_binary(path, triangles, name),
    }
}

fn facet_normal(tri: &Triangle) -> (f64, f64, f64) {
    let v1 = tri.b - tri.a;
    let v2 = tri.c - tri.a;
    match v1.cross(&v2).normalize() {
        Some(n) => (n.dx, n.dy, n.dz),
        None => (0.0, 0.0, 1.0),
    }
}

fn write_stl_ascii(path: &Path, triangles: &[Triangle], name: &str) -> Result<()> {
    let mut out = Vec::new();
    writeln!(out, "solid {}", name)?;
    for tri in triangles {
        let (nx, ny, nz) = facet_normal(tri);
        writeln!(out, "  facet normal {} {} {}", nx, ny, nz)?;
        writeln!(out, "    outer loop")?;
        for p in [tri.a, tri.b, tri.c] {
            writeln!(out, "      vertex {} {} {}", p.x, p.y, p.z)?;
        }
        writeln!(out, "    endloop")?;
        writeln!(out, "  endfacet")?;
    }
    writeln!(out, "endsolid {}", name)?;
    fs::write(path, out)?;
    Ok(())
}

fn write_stl_binary(path: &Path, triangles: &[Triangle], name: &str) -> Result<()> {
    let mut out = Vec::with_capacity(84 + triangles.len() * 50);

    let mut header = [0u8; 80];
    let tag = format!("binary STL - {}", name);
    let bytes = tag.as_bytes();
    let len = bytes.len().min(80);
    header[..len].copy_from_slice(&bytes[..len]);
    out.extend_from_slice(&header);
    out.extend_from_slice(&(triangles.len() as u32).to_le_bytes());

    for tri in triangles {
        let (nx, ny, nz) = facet_normal(tri);
        for v in [nx, ny, nz] {
            out.extend_from_slice(&(v as f32).to_le_bytes());
        }
        for p in [tri.a, tri.b, tri.c] {
            for v in [p.x, p.y, p.z] {
                out.extend_from_slice(&(v as f32).to_le_bytes());
            }
        }
        out.extend_from_slice(&0u16.to_le_bytes());
    }
    fs::write(path, out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_box(path: &Path, format: StlFormat) -> MeshGeometry {
        let mesh = MeshGeometry::from_box(10., 10., 10., None).unwrap();
        write_stl(path, mesh.triangles(), "box", format).unwrap();
        mesh
    }

    fn config_for(path: &Path) -> MeshConfig {
        MeshConfig {
            path: path.to_string_lossy().into_owned(),
            ..MeshConfig::default()
        }
    }

    #[test]
    fn test_unit_parsing() {
        assert_eq!("mm".parse::<LengthUnit>().unwrap(), LengthUnit::Mm);
        assert_eq!("inch".parse::<LengthUnit>().unwrap(), LengthUnit::Inch);
        let err = "furlong".parse::<LengthUnit>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedUnit(_)));
    }

    #[test]
    fn test_load_binary_cube() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("box.stl");
        write_box(&path, StlFormat::Binary);

        let mesh = load_stl(&config_for(&path))?;
        assert_eq!(mesh.triangle_count(), 12);
        assert_eq!(mesh.vertex_count(), 8);
        assert!(mesh.is_watertight());
        assert!((mesh.volume_mm3() - 1000.).abs() < 1e-6);
        let (bx, by, bz) = mesh.bbox_extents();
        assert!((bx - 10.).abs() < 1e-4);
        assert!((by - 10.).abs() < 1e-4);
        assert!((bz - 10.).abs() < 1e-4);
        Ok(())
    }

    #[test]
    fn test_load_ascii_cube() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("box.stl");
        write_box(&path, StlFormat::Ascii);

        let mesh = load_stl(&config_for(&path))?;
        assert_eq!(mesh.triangle_count(), 12);
        assert!(mesh.is_watertight());
        assert!((mesh.volume_mm3() - 1000.).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_unit_and_scale_applied() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("box.stl");
        write_box(&path, StlFormat::Binary);

        let config = MeshConfig {
            input_unit: LengthUnit::Cm,
            scale_to_mm: 2.0,
            ..config_for(&path)
        };
        let mesh = load_stl(&config)?;
        // 10 (raw) * 10 (cm->mm) * 2 (user scale) = 200 mm per side
        let (bx, _, _) = mesh.bbox_extents();
        assert!((bx - 200.).abs() < 1e-3);
        Ok(())
    }

    #[test]
    fn test_pose_applied() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("box.stl");
        write_box(&path, StlFormat::Binary);

        let config = MeshConfig {
            pose: Pose {
                tx_mm: 100.,
                ..Pose::identity()
            },
            ..config_for(&path)
        };
        let mesh = load_stl(&config)?;
        assert!((mesh.bbox_min().x - 100.).abs() < 1e-4);
        assert!((mesh.bbox_max().x - 110.).abs() < 1e-4);
        Ok(())
    }

    #[test]
    fn test_invalid_scale_fails_before_io() {
        let config = MeshConfig {
            path: "does-not-exist.stl".to_string(),
            scale_to_mm: 0.0,
            ..MeshConfig::default()
        };
        let err = load_stl(&config).unwrap_err();
        assert!(matches!(err, Error::InvalidScale(_)));
    }

    #[test]
    fn test_missing_file() {
        let config = MeshConfig {
            path: "does-not-exist.stl".to_string(),
            ..MeshConfig::default()
        };
        let err = load_stl(&config).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }

    #[test]
    fn test_open_mesh_rejected_when_required() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("open.stl");
        let cube = MeshGeometry::from_box(10., 10., 10., None)?;
        let mut tris = cube.triangles().to_vec();
        tris.pop();
        write_stl(&path, &tris, "open", StlFormat::Binary)?;

        let err = load_stl(&config_for(&path)).unwrap_err();
        assert!(matches!(err, Error::NonWatertightMesh));

        // With the requirement lifted, diagnostics come through
        let config = MeshConfig {
            watertight_required: false,
            ..config_for(&path)
        };
        let mesh = load_stl(&config)?;
        assert!(!mesh.is_watertight());
        assert_eq!(mesh.triangle_count(), 11);
        Ok(())
    }

    #[test]
    fn test_truncated_binary_rejected() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("short.stl");
        let mut header = vec![0u8; 80];
        header.extend_from_slice(&100u32.to_le_bytes()); // claims 100 triangles
        header.extend_from_slice(&[0u8; 50]); // provides one
        fs::write(&path, header)?;

        let err = load_stl(&config_for(&path)).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
        Ok(())
    }

    #[test]
    fn test_ascii_with_bad_vertex_count() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("bad.stl");
        fs::write(
            &path,
            "solid bad\n  vertex 0 0 0\n  vertex 1 0 0\nendsolid bad\n",
        )?;

        let err = load_stl(&config_for(&path)).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)));
        Ok(())
    }

    #[test]
    fn test_ascii_scientific_notation() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("sci.stl");
        fs::write(
            &path,
            "solid sci\n\
             facet normal 0 0 1\n outer loop\n\
             vertex -1.0e1 0.0 0.0\n vertex 1.5E+1 0.0 0.0\n vertex 0.0 2e0 0.0\n\
             endloop\n endfacet\nendsolid sci\n",
        )?;

        let config = MeshConfig {
            watertight_required: false,
            ..config_for(&path)
        };
        let mesh = load_stl(&config)?;
        assert_eq!(mesh.triangle_count(), 1);
        assert!((mesh.bbox_min().x + 10.).abs() < 1e-9);
        assert!((mesh.bbox_max().x - 15.).abs() < 1e-9);
        Ok(())
    }
}
