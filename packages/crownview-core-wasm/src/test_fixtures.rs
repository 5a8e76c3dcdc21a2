// Builders for in-memory .shp / .dbf buffers used across the unit tests.
// They write bytes directly so tests can produce files a conforming writer
// would refuse: mixed shape types and arbitrary record numbering.

use crate::models::Ring;

pub enum ShpShape {
    Null,
    Point(f64, f64),
    Polygon(Vec<Ring>),
    PolygonZ(Vec<Ring>),
}

pub struct ShpBuilder {
    shapes: Vec<ShpShape>,
    first_record_number: i32,
}

impl ShpBuilder {
    pub fn new() -> Self {
        ShpBuilder {
            shapes: Vec::new(),
            first_record_number: 1,
        }
    }

    /// Number records from `first` instead of 1.
    pub fn numbered_from(mut self, first: i32) -> Self {
        self.first_record_number = first;
        self
    }

    pub fn shape(mut self, shape: ShpShape) -> Self {
        self.shapes.push(shape);
        self
    }

    pub fn polygon(self, rings: Vec<Ring>) -> Self {
        self.shape(ShpShape::Polygon(rings))
    }

    pub fn build(&self) -> Vec<u8> {
        let mut all_points: Vec<[f64; 2]> = Vec::new();
        let mut body = Vec::new();

        for (index, shape) in self.shapes.iter().enumerate() {
            let content = match shape {
                ShpShape::Null => 0i32.to_le_bytes().to_vec(),
                ShpShape::Point(x, y) => {
                    all_points.push([*x, *y]);
                    let mut c = 1i32.to_le_bytes().to_vec();
                    c.extend_from_slice(&x.to_le_bytes());
                    c.extend_from_slice(&y.to_le_bytes());
                    c
                }
                ShpShape::Polygon(rings) | ShpShape::PolygonZ(rings) => {
                    let z = matches!(shape, ShpShape::PolygonZ(_));
                    let mut parts = Vec::new();
                    let mut points = Vec::new();
                    for ring in rings {
                        parts.push(points.len() as i32);
                        points.extend_from_slice(ring);
                    }
                    all_points.extend_from_slice(&points);
                    polygon_content(if z { 15 } else { 5 }, &parts, &points, z)
                }
            };

            let record_number = self.first_record_number + index as i32;
            body.extend_from_slice(&record_number.to_be_bytes());
            body.extend_from_slice(&((content.len() / 2) as i32).to_be_bytes());
            body.extend_from_slice(&content);
        }

        let bbox = bbox_of(&all_points);
        let mut out = Vec::with_capacity(100 + body.len());
        out.extend_from_slice(&9994i32.to_be_bytes());
        out.extend_from_slice(&[0u8; 20]);
        out.extend_from_slice(&(((100 + body.len()) / 2) as i32).to_be_bytes());
        out.extend_from_slice(&1000i32.to_le_bytes());
        out.extend_from_slice(&5i32.to_le_bytes());
        for v in bbox {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out.extend_from_slice(&[0u8; 32]);
        out.extend_from_slice(&body);
        out
    }
}

fn bbox_of(points: &[[f64; 2]]) -> [f64; 4] {
    if points.is_empty() {
        return [0.0; 4];
    }
    let mut bbox = [f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY];
    for p in points {
        bbox[0] = bbox[0].min(p[0]);
        bbox[1] = bbox[1].min(p[1]);
        bbox[2] = bbox[2].max(p[0]);
        bbox[3] = bbox[3].max(p[1]);
    }
    bbox
}

fn polygon_content(shape_type: i32, parts: &[i32], points: &[[f64; 2]], with_z: bool) -> Vec<u8> {
    let mut c = shape_type.to_le_bytes().to_vec();
    for v in bbox_of(points) {
        c.extend_from_slice(&v.to_le_bytes());
    }
    c.extend_from_slice(&(parts.len() as i32).to_le_bytes());
    c.extend_from_slice(&(points.len() as i32).to_le_bytes());
    for part in parts {
        c.extend_from_slice(&part.to_le_bytes());
    }
    for p in points {
        c.extend_from_slice(&p[0].to_le_bytes());
        c.extend_from_slice(&p[1].to_le_bytes());
    }
    if with_z {
        // z range followed by one z per point
        c.extend_from_slice(&0f64.to_le_bytes());
        c.extend_from_slice(&10f64.to_le_bytes());
        for _ in points {
            c.extend_from_slice(&5f64.to_le_bytes());
        }
    }
    c
}

pub struct DbfField {
    pub name: &'static str,
    pub kind: u8,
    pub length: u8,
}

impl DbfField {
    pub fn text(name: &'static str, length: u8) -> Self {
        DbfField { name, kind: b'C', length }
    }

    pub fn numeric(name: &'static str, length: u8) -> Self {
        DbfField { name, kind: b'N', length }
    }

    pub fn logical(name: &'static str) -> Self {
        DbfField { name, kind: b'L', length: 1 }
    }

    pub fn date(name: &'static str) -> Self {
        DbfField { name, kind: b'D', length: 8 }
    }
}

#[derive(Default)]
pub struct DbfBuilder {
    fields: Vec<DbfField>,
    rows: Vec<Vec<String>>,
}

impl DbfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: DbfField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn row(mut self, values: &[&str]) -> Self {
        self.rows.push(values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let header_len = 32 + 32 * self.fields.len() + 1;
        let record_len = 1 + self.fields.iter().map(|f| f.length as usize).sum::<usize>();

        let mut out = Vec::new();
        out.push(0x03);
        out.extend_from_slice(&[124, 1, 1]);
        out.extend_from_slice(&(self.rows.len() as u32).to_le_bytes());
        out.extend_from_slice(&(header_len as u16).to_le_bytes());
        out.extend_from_slice(&(record_len as u16).to_le_bytes());
        out.extend_from_slice(&[0u8; 20]);

        for field in &self.fields {
            let mut descriptor = [0u8; 32];
            descriptor[..field.name.len()].copy_from_slice(field.name.as_bytes());
            descriptor[11] = field.kind;
            descriptor[16] = field.length;
            out.extend_from_slice(&descriptor);
        }
        out.push(0x0D);

        for values in &self.rows {
            out.push(b' ');
            for (field, value) in self.fields.iter().zip(values) {
                let mut cell = value.as_bytes().to_vec();
                cell.resize(field.length as usize, b' ');
                out.extend_from_slice(&cell);
            }
        }
        out.push(0x1A);
        out
    }
}
