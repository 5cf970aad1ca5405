use anyhow::{Context, Result};
use log::{debug, warn};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::core::geometry::BBox;

/// Form XObjects nested deeper than this are not entered.
const MAX_FORM_DEPTH: usize = 8;

/// Affine transform `[a b c d e f]` as used by the `cm` operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn from_operands(operands: &[Object]) -> Option<Self> {
        if operands.len() != 6 {
            return None;
        }
        let v: Vec<f64> = operands.iter().map(number).collect::<Option<_>>()?;
        Some(Self {
            a: v[0],
            b: v[1],
            c: v[2],
            d: v[3],
            e: v[4],
            f: v[5],
        })
    }

    /// `self` applied first, then `next`.
    pub fn then(&self, next: &Matrix) -> Matrix {
        Matrix {
            a: self.a * next.a + self.b * next.c,
            b: self.a * next.b + self.b * next.d,
            c: self.c * next.a + self.d * next.c,
            d: self.c * next.b + self.d * next.d,
            e: self.e * next.a + self.f * next.c + next.e,
            f: self.e * next.b + self.f * next.d + next.f,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Images are painted into the unit square of the current space.
    fn unit_square_bbox(&self) -> BBox {
        let corners = [
            self.apply(0.0, 0.0),
            self.apply(1.0, 0.0),
            self.apply(0.0, 1.0),
            self.apply(1.0, 1.0),
        ];
        BBox::from_points(&corners).unwrap_or(BBox::new(self.e, self.f, self.e, self.f))
    }
}

/// Finds every image painted on a page, including those inside form XObjects.
///
/// Boxes are in PDF user space (origin bottom-left).
pub fn locate_images(doc: &Document, page_id: ObjectId) -> Result<Vec<BBox>> {
    let data = doc
        .get_page_content(page_id)
        .with_context(|| format!("failed to read content stream of page object {page_id:?}"))?;
    let content = Content::decode(&data)
        .with_context(|| format!("failed to decode content stream of page object {page_id:?}"))?;

    let resources = page_resources(doc, page_id)?;

    let mut walker = ContentWalker {
        doc,
        placements: Vec::new(),
    };
    walker.walk(&content.operations, &resources, Matrix::IDENTITY, 0)?;
    Ok(walker.placements)
}

/// The page's MediaBox, following `/Parent` links when it is inherited.
pub fn media_box(doc: &Document, page_id: ObjectId) -> Result<BBox> {
    let chain = page_tree_chain(doc, page_id)?;
    let obj = inherited(&chain, b"MediaBox")
        .with_context(|| format!("page object {page_id:?} has no MediaBox"))?;
    rectangle(doc, obj, "MediaBox")
}

/// The visible region of the page: its CropBox, or the MediaBox when none is set.
pub fn crop_box(doc: &Document, page_id: ObjectId) -> Result<BBox> {
    let chain = page_tree_chain(doc, page_id)?;
    match inherited(&chain, b"CropBox") {
        Some(obj) => rectangle(doc, obj, "CropBox"),
        None => media_box(doc, page_id),
    }
}

/// Clockwise page rotation in degrees, normalized to `0..360`.
pub fn rotation(doc: &Document, page_id: ObjectId) -> Result<i64> {
    let chain = page_tree_chain(doc, page_id)?;
    match inherited(&chain, b"Rotate") {
        Some(obj) => {
            let degrees = resolve(doc, obj)?
                .as_i64()
                .context("Rotate is not an integer")?;
            Ok(degrees.rem_euclid(360))
        }
        None => Ok(0),
    }
}

/// The page dictionary followed by its `/Pages` ancestors, nearest first.
fn page_tree_chain(doc: &Document, page_id: ObjectId) -> Result<Vec<&Dictionary>> {
    let mut chain = vec![doc
        .get_dictionary(page_id)
        .with_context(|| format!("page object {page_id:?} is not a dictionary"))?];
    let mut seen = vec![page_id];

    while let Some(parent) = chain
        .last()
        .and_then(|dict| dict.get(b"Parent").ok())
        .and_then(|obj| obj.as_reference().ok())
    {
        if seen.contains(&parent) {
            anyhow::bail!("page tree loops back to object {parent:?}");
        }
        seen.push(parent);
        chain.push(
            doc.get_dictionary(parent)
                .with_context(|| format!("parent {parent:?} is not a dictionary"))?,
        );
    }
    Ok(chain)
}

fn inherited<'a>(chain: &[&'a Dictionary], key: &[u8]) -> Option<&'a Object> {
    chain.iter().find_map(|dict| dict.get(key).ok())
}

/// Resource dictionaries visible to a page, its own first. Inline and
/// referenced `/Resources` are both followed.
fn page_resources(doc: &Document, page_id: ObjectId) -> Result<Vec<&Dictionary>> {
    let mut resources = Vec::new();
    for node in page_tree_chain(doc, page_id)? {
        let Ok(obj) = node.get(b"Resources") else {
            continue;
        };
        match resolve(doc, obj)?.as_dict() {
            Ok(dict) => resources.push(dict),
            Err(_) => warn!("ignoring /Resources of page object {page_id:?}: not a dictionary"),
        }
    }
    Ok(resources)
}

fn rectangle(doc: &Document, obj: &Object, key: &str) -> Result<BBox> {
    let array = resolve(doc, obj)?
        .as_array()
        .with_context(|| format!("{key} is not an array"))?;
    let values: Vec<f64> = array
        .iter()
        .map(|o| resolve(doc, o).ok().and_then(number))
        .collect::<Option<_>>()
        .with_context(|| format!("{key} holds a non-numeric entry"))?;
    if values.len() != 4 {
        anyhow::bail!("{key} must have 4 elements, found {}", values.len());
    }
    Ok(BBox::new(
        values[0].min(values[2]),
        values[1].min(values[3]),
        values[0].max(values[2]),
        values[1].max(values[3]),
    ))
}

struct ContentWalker<'a> {
    doc: &'a Document,
    placements: Vec<BBox>,
}

impl<'a> ContentWalker<'a> {
    fn walk(
        &mut self,
        operations: &[Operation],
        resources: &[&'a Dictionary],
        base: Matrix,
        depth: usize,
    ) -> Result<()> {
        let mut ctm = base;
        let mut saved: Vec<Matrix> = Vec::new();

        for op in operations {
            match op.operator.as_str() {
                "q" => saved.push(ctm),
                "Q" => ctm = saved.pop().unwrap_or(base),
                "cm" => match Matrix::from_operands(&op.operands) {
                    Some(m) => ctm = m.then(&ctm),
                    None => warn!("ignoring malformed cm operands: {:?}", op.operands),
                },
                "BI" => self.placements.push(ctm.unit_square_bbox()),
                "Do" => {
                    let Some(name) = op.operands.first().and_then(|o| o.as_name().ok()) else {
                        continue;
                    };
                    self.paint_xobject(name, resources, ctm, depth)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn paint_xobject(
        &mut self,
        name: &[u8],
        resources: &[&'a Dictionary],
        ctm: Matrix,
        depth: usize,
    ) -> Result<()> {
        let label = String::from_utf8_lossy(name).into_owned();
        let Some(stream) = find_xobject(self.doc, resources, name)? else {
            warn!("XObject /{label} is not defined in the page resources");
            return Ok(());
        };

        match stream.dict.get(b"Subtype").and_then(Object::as_name) {
            Ok(b"Image") => {
                debug!("image /{label} painted");
                self.placements.push(ctm.unit_square_bbox());
            }
            Ok(b"Form") if depth < MAX_FORM_DEPTH => {
                let matrix = stream
                    .dict
                    .get(b"Matrix")
                    .ok()
                    .and_then(|m| resolve(self.doc, m).ok())
                    .and_then(|m| m.as_array().ok())
                    .and_then(|m| Matrix::from_operands(m))
                    .unwrap_or(Matrix::IDENTITY);

                let data = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                let content = Content::decode(&data)
                    .with_context(|| format!("failed to decode form XObject /{label}"))?;

                let mut form_resources: Vec<&'a Dictionary> = Vec::new();
                if let Ok(obj) = stream.dict.get(b"Resources") {
                    if let Ok(dict) = resolve(self.doc, obj)?.as_dict() {
                        form_resources.push(dict);
                    }
                }
                form_resources.extend_from_slice(resources);

                debug!("entering form XObject /{label} at depth {}", depth + 1);
                self.walk(
                    &content.operations,
                    &form_resources,
                    matrix.then(&ctm),
                    depth + 1,
                )?;
            }
            Ok(b"Form") => warn!("form XObject /{label} nested too deeply, skipped"),
            _ => {}
        }
        Ok(())
    }
}

fn find_xobject<'a>(
    doc: &'a Document,
    resources: &[&'a Dictionary],
    name: &[u8],
) -> Result<Option<&'a Stream>> {
    for &dict in resources {
        let Ok(xobjects) = dict.get(b"XObject") else {
            continue;
        };
        let Ok(xobjects) = resolve(doc, xobjects)?.as_dict() else {
            continue;
        };
        if let Ok(entry) = xobjects.get(name) {
            return Ok(resolve(doc, entry)?.as_stream().ok());
        }
    }
    Ok(None)
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object> {
    match obj {
        Object::Reference(id) => doc
            .get_object(*id)
            .with_context(|| format!("dangling reference {id:?}")),
        other => Ok(other),
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}
