/// PLY vertex-list serialisation
use crate::config::PlyEncoding;
use crate::constants::COORDINATE_PRECISION;
use crate::sphere::SpherePoint;
use std::io::{self, Write};

/// Write `points` as a PLY vertex element.
///
/// Coordinates are declared as 32-bit floats. With `with_colour`, each vertex
/// also carries `red green blue` uchar properties; points without a colour
/// are written white.
pub fn write_ply<W: Write>(
    writer: &mut W,
    points: &[SpherePoint],
    encoding: PlyEncoding,
    with_colour: bool,
) -> io::Result<()> {
    write_header(writer, points.len(), encoding, with_colour)?;

    match encoding {
        PlyEncoding::Ascii => write_ascii_body(writer, points, with_colour),
        PlyEncoding::Binary => write_binary_body(writer, points, with_colour),
    }
}

fn write_header<W: Write>(
    writer: &mut W,
    vertex_count: usize,
    encoding: PlyEncoding,
    with_colour: bool,
) -> io::Result<()> {
    let format = match encoding {
        PlyEncoding::Ascii => "ascii",
        PlyEncoding::Binary => "binary_little_endian",
    };

    writeln!(writer, "ply")?;
    writeln!(writer, "format {format} 1.0")?;
    writeln!(writer, "element vertex {vertex_count}")?;
    writeln!(writer, "property float x")?;
    writeln!(writer, "property float y")?;
    writeln!(writer, "property float z")?;
    if with_colour {
        writeln!(writer, "property uchar red")?;
        writeln!(writer, "property uchar green")?;
        writeln!(writer, "property uchar blue")?;
    }
    writeln!(writer, "end_header")
}

fn write_ascii_body<W: Write>(
    writer: &mut W,
    points: &[SpherePoint],
    with_colour: bool,
) -> io::Result<()> {
    let p = COORDINATE_PRECISION;
    for point in points {
        write!(writer, "{:.p$} {:.p$} {:.p$}", point.x, point.y, point.z)?;
        if with_colour {
            let [r, g, b] = vertex_colour(point);
            write!(writer, " {r} {g} {b}")?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

fn write_binary_body<W: Write>(
    writer: &mut W,
    points: &[SpherePoint],
    with_colour: bool,
) -> io::Result<()> {
    for point in points {
        for coordinate in point.position() {
            writer.write_all(&(coordinate as f32).to_le_bytes())?;
        }
        if with_colour {
            writer.write_all(&vertex_colour(point))?;
        }
    }
    Ok(())
}

fn vertex_colour(point: &SpherePoint) -> [u8; 3] {
    point.colour.unwrap_or([255, 255, 255])
}
