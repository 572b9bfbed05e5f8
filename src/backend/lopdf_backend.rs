//! [`PdfBackend`] implementation backed by lopdf.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use flate2::read::ZlibDecoder;
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use super::pixels::{self, ColorSpace, RasterLayout};
use super::PdfBackend;
use crate::detect::{detect_format_from_bytes, detect_format_from_path};
use crate::error::{Error, Result};
use crate::model::{ExtractedImage, ImageRef, Xref};

/// Maximum nesting of Form XObjects searched for images.
const MAX_FORM_DEPTH: usize = 8;
/// Maximum page-tree depth searched for inherited resources.
const MAX_TREE_DEPTH: usize = 32;
/// Maximum chain of indirect references followed.
const MAX_DEREF: usize = 8;

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
///
/// The document is owned by the backend and released when it is dropped.
pub struct LopdfBackend {
    doc: LopdfDocument,
    pages: Vec<ObjectId>,
}

impl LopdfBackend {
    /// Open a PDF file.
    ///
    /// Fails with [`Error::DocumentOpen`] if the file is missing, does not
    /// carry a PDF header, or cannot be loaded.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let input = path.display().to_string();
        let open_error = |reason: String| Error::DocumentOpen {
            input: input.clone(),
            reason,
        };

        detect_format_from_path(path).map_err(|e| open_error(e.to_string()))?;
        let doc = LopdfDocument::load(path).map_err(|e| open_error(e.to_string()))?;
        Ok(Self::from_document(doc))
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        let open_error = |reason: String| Error::DocumentOpen {
            input: "<memory>".to_string(),
            reason,
        };

        detect_format_from_bytes(data).map_err(|e| open_error(e.to_string()))?;
        let doc = LopdfDocument::load_mem(data).map_err(|e| open_error(e.to_string()))?;
        Ok(Self::from_document(doc))
    }

    /// Wrap an already loaded document.
    pub fn from_document(doc: LopdfDocument) -> Self {
        if doc.is_encrypted() {
            log::warn!("Document is encrypted; image streams may not decode");
        }
        let pages = doc.get_pages().into_values().collect();
        Self { doc, pages }
    }

    /// PDF version from the file header (e.g. "1.7").
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    fn deref<'a>(&'a self, mut obj: &'a Object) -> &'a Object {
        for _ in 0..MAX_DEREF {
            match obj {
                Object::Reference(id) => match self.doc.get_object(*id) {
                    Ok(target) => obj = target,
                    Err(_) => break,
                },
                _ => break,
            }
        }
        obj
    }

    fn as_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        match self.deref(obj) {
            Object::Dictionary(d) => Some(d),
            Object::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }

    fn dict_int(&self, dict: &Dictionary, key: &[u8]) -> Option<i64> {
        dict.get(key).ok().and_then(|o| self.deref(o).as_i64().ok())
    }

    fn dict_u32(&self, dict: &Dictionary, key: &[u8]) -> Option<u32> {
        self.dict_int(dict, key).and_then(|v| u32::try_from(v).ok())
    }

    fn dict_name<'a>(&'a self, dict: &'a Dictionary, key: &[u8]) -> Option<&'a [u8]> {
        dict.get(key).ok().and_then(|o| self.deref(o).as_name().ok())
    }

    /// Resource dictionary of a page, inherited from the page tree if needed.
    fn page_resources(&self, page_id: ObjectId) -> Result<Option<&Dictionary>> {
        let mut node = self.doc.get_dictionary(page_id)?;
        for _ in 0..MAX_TREE_DEPTH {
            if let Ok(resources) = node.get(b"Resources") {
                return Ok(self.as_dict(resources));
            }
            match node.get(b"Parent").and_then(Object::as_reference) {
                Ok(parent) => node = self.doc.get_dictionary(parent)?,
                Err(_) => break,
            }
        }
        Ok(None)
    }

    fn collect_images(
        &self,
        resources: &Dictionary,
        depth: usize,
        seen: &mut HashSet<ObjectId>,
        out: &mut Vec<ImageRef>,
    ) {
        let Some(xobjects) = resources.get(b"XObject").ok().and_then(|o| self.as_dict(o)) else {
            return;
        };

        for (name, obj) in xobjects.iter() {
            let Ok(id) = obj.as_reference() else {
                continue;
            };
            if !seen.insert(id) {
                continue;
            }
            let Ok(Object::Stream(stream)) = self.doc.get_object(id) else {
                log::debug!("XObject {} {} R is not a stream", id.0, id.1);
                continue;
            };

            match self.dict_name(&stream.dict, b"Subtype") {
                Some(b"Image") => {
                    let mut image = ImageRef::new(id, String::from_utf8_lossy(name));
                    image.width = self.dict_u32(&stream.dict, b"Width");
                    image.height = self.dict_u32(&stream.dict, b"Height");
                    out.push(image);
                }
                Some(b"Form") if depth < MAX_FORM_DEPTH => {
                    if let Some(form_resources) =
                        stream.dict.get(b"Resources").ok().and_then(|o| self.as_dict(o))
                    {
                        self.collect_images(form_resources, depth + 1, seen, out);
                    }
                }
                _ => {}
            }
        }
    }

    fn filter_names(&self, dict: &Dictionary) -> Vec<String> {
        match dict.get(b"Filter").map(|f| self.deref(f)) {
            Ok(Object::Name(name)) => vec![String::from_utf8_lossy(name).to_string()],
            Ok(Object::Array(items)) => items
                .iter()
                .filter_map(|o| self.deref(o).as_name().ok())
                .map(|n| String::from_utf8_lossy(n).to_string())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Undo the filters applied on top of an already encoded image (JPEG etc).
    fn strip_leading_filters(
        &self,
        xref: Xref,
        content: &[u8],
        leading: &[String],
    ) -> Result<Vec<u8>> {
        let mut data = content.to_vec();
        for filter in leading {
            match filter.as_str() {
                "FlateDecode" | "Fl" => {
                    let mut inflated = Vec::new();
                    ZlibDecoder::new(data.as_slice())
                        .read_to_end(&mut inflated)
                        .map_err(|e| {
                            Error::resolution(xref, format!("FlateDecode failed: {}", e))
                        })?;
                    data = inflated;
                }
                other => {
                    return Err(Error::resolution(
                        xref,
                        format!("unsupported filter {} before encoded image data", other),
                    ))
                }
            }
        }
        Ok(data)
    }

    fn raster_layout(&self, xref: Xref, dict: &Dictionary) -> Result<RasterLayout> {
        let width = self
            .dict_u32(dict, b"Width")
            .ok_or_else(|| Error::resolution(xref, "missing /Width"))?;
        let height = self
            .dict_u32(dict, b"Height")
            .ok_or_else(|| Error::resolution(xref, "missing /Height"))?;

        let is_mask = dict
            .get(b"ImageMask")
            .ok()
            .and_then(|o| self.deref(o).as_bool().ok())
            .unwrap_or(false);

        let (bits_per_component, color_space, separation) = if is_mask {
            (1, ColorSpace::Gray, false)
        } else {
            let bpc = self.dict_int(dict, b"BitsPerComponent").unwrap_or(8);
            let bpc = u8::try_from(bpc)
                .map_err(|_| {
                    Error::resolution(xref, format!("invalid bits per component: {}", bpc))
                })?;
            let cs = dict
                .get(b"ColorSpace")
                .map_err(|_| Error::resolution(xref, "missing /ColorSpace"))?;
            let (color_space, separation) = self.color_space(xref, cs, 0)?;
            (bpc, color_space, separation)
        };

        Ok(RasterLayout {
            width,
            height,
            bits_per_component,
            color_space,
            invert: self.decode_inverted(dict) != separation,
        })
    }

    /// Whether a `/Decode` array swaps the first component's range.
    fn decode_inverted(&self, dict: &Dictionary) -> bool {
        let Some(Object::Array(items)) = dict.get(b"Decode").ok().map(|o| self.deref(o)) else {
            return false;
        };
        match (items.first().and_then(number), items.get(1).and_then(number)) {
            (Some(lo), Some(hi)) => lo > hi,
            _ => false,
        }
    }

    /// Parse a colour space; the flag is set for tint-based spaces where a
    /// sample of 1 means full colorant.
    fn color_space(&self, xref: Xref, obj: &Object, depth: usize) -> Result<(ColorSpace, bool)> {
        if depth > 2 {
            return Err(Error::resolution(xref, "color space nested too deeply"));
        }
        let unsupported = |name: &[u8]| {
            Error::resolution(
                xref,
                format!("unsupported color space /{}", String::from_utf8_lossy(name)),
            )
        };

        match self.deref(obj) {
            Object::Name(name) => device_color_space(name.as_slice())
                .map(|cs| (cs, false))
                .ok_or_else(|| unsupported(name.as_slice())),
            Object::Array(items) => {
                let family = items
                    .first()
                    .and_then(|o| self.deref(o).as_name().ok())
                    .ok_or_else(|| Error::resolution(xref, "malformed color space array"))?;
                match family {
                    b"CalGray" => Ok((ColorSpace::Gray, false)),
                    b"CalRGB" => Ok((ColorSpace::Rgb, false)),
                    b"Separation" => Ok((ColorSpace::Gray, true)),
                    b"ICCBased" => self.icc_color_space(xref, items.get(1), depth),
                    b"Indexed" | b"I" => self.indexed_color_space(xref, items, depth),
                    other => device_color_space(other)
                        .map(|cs| (cs, false))
                        .ok_or_else(|| unsupported(other)),
                }
            }
            _ => Err(Error::resolution(xref, "malformed /ColorSpace entry")),
        }
    }

    fn icc_color_space(
        &self,
        xref: Xref,
        profile: Option<&Object>,
        depth: usize,
    ) -> Result<(ColorSpace, bool)> {
        let dict = profile
            .and_then(|o| self.as_dict(o))
            .ok_or_else(|| Error::resolution(xref, "ICCBased color space without profile stream"))?;
        match self.dict_int(dict, b"N") {
            Some(1) => Ok((ColorSpace::Gray, false)),
            Some(3) => Ok((ColorSpace::Rgb, false)),
            Some(4) => Ok((ColorSpace::Cmyk, false)),
            n => match dict.get(b"Alternate") {
                Ok(alternate) => self.color_space(xref, alternate, depth + 1),
                Err(_) => Err(Error::resolution(
                    xref,
                    format!("ICCBased profile with unsupported component count {:?}", n),
                )),
            },
        }
    }

    fn indexed_color_space(
        &self,
        xref: Xref,
        items: &[Object],
        depth: usize,
    ) -> Result<(ColorSpace, bool)> {
        let [_, base, hival, lookup] = items else {
            return Err(Error::resolution(xref, "Indexed color space needs 4 entries"));
        };
        let (base, _) = self.color_space(xref, base, depth + 1)?;
        if matches!(base, ColorSpace::Indexed { .. }) {
            return Err(Error::resolution(xref, "nested Indexed color space"));
        }
        let hival = self
            .deref(hival)
            .as_i64()
            .map(|v| v.clamp(0, 255) as u8)
            .map_err(|_| Error::resolution(xref, "Indexed color space without hival"))?;
        let lookup = match self.deref(lookup) {
            Object::String(bytes, _) => bytes.clone(),
            Object::Stream(stream) => self
                .stream_data(stream)
                .map_err(|e| Error::resolution(xref, format!("cannot read palette: {}", e)))?,
            _ => return Err(Error::resolution(xref, "Indexed color space without lookup table")),
        };

        Ok((
            ColorSpace::Indexed {
                base: Box::new(base),
                hival,
                lookup,
            },
            false,
        ))
    }

    /// Decompress a stream through lopdf.
    ///
    /// lopdf refuses streams whose Subtype is Image and only honours a
    /// direct `/DecodeParms` dictionary, so the copy handed to it carries a
    /// direct filter list and the parameters of its predictor stage.
    fn stream_data(&self, stream: &Stream) -> std::result::Result<Vec<u8>, lopdf::Error> {
        let filters = self.filter_names(&stream.dict);
        if filters.is_empty() {
            return Ok(stream.content.clone());
        }

        let mut plain = stream.clone();
        plain.dict.remove(b"Subtype");
        plain.dict.set(
            "Filter",
            filters
                .iter()
                .map(|f| Object::Name(f.as_bytes().to_vec()))
                .collect::<Vec<_>>(),
        );
        match self.predictor_params(&stream.dict, &filters) {
            Some(params) => plain.dict.set("DecodeParms", params.clone()),
            None => {
                plain.dict.remove(b"DecodeParms");
            }
        }
        plain.decompressed_content()
    }

    /// `/DecodeParms` of the Flate or LZW stage, resolved to a dictionary.
    fn predictor_params<'a>(
        &'a self,
        dict: &'a Dictionary,
        filters: &[String],
    ) -> Option<&'a Dictionary> {
        match self.deref(dict.get(b"DecodeParms").ok()?) {
            Object::Array(items) => {
                let stage = filters
                    .iter()
                    .position(|f| matches!(f.as_str(), "FlateDecode" | "LZWDecode"))?;
                items.get(stage).and_then(|o| self.as_dict(o))
            }
            other => self.as_dict(other),
        }
    }
}

impl PdfBackend for LopdfBackend {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_images(&self, page_index: u32) -> Result<Vec<ImageRef>> {
        let page_id = *self
            .pages
            .get(page_index as usize)
            .ok_or(Error::PageOutOfRange(
                page_index.saturating_add(1),
                self.page_count(),
            ))?;

        let mut images = Vec::new();
        if let Some(resources) = self.page_resources(page_id)? {
            let mut seen = HashSet::new();
            self.collect_images(resources, 0, &mut seen, &mut images);
        }
        log::debug!("Page {}: {} image XObjects", page_index.saturating_add(1), images.len());
        Ok(images)
    }

    fn resolve_image(&self, image: &ImageRef) -> Result<ExtractedImage> {
        let xref = image.xref;
        let stream = match self.doc.get_object(xref.into()) {
            Ok(Object::Stream(stream)) => stream,
            Ok(_) => return Err(Error::resolution(xref, "not a stream object")),
            Err(e) => return Err(Error::resolution(xref, e.to_string())),
        };
        if self.dict_name(&stream.dict, b"Subtype") != Some(b"Image".as_slice()) {
            return Err(Error::resolution(xref, "not an image XObject"));
        }

        let filters = self.filter_names(&stream.dict);
        if let Some((last, leading)) = filters.split_last() {
            if let Some(tag) = passthrough_format(last) {
                let data = self.strip_leading_filters(xref, &stream.content, leading)?;
                let mut extracted = ExtractedImage::with_format(data, tag);
                if let (Some(w), Some(h)) = (image.width, image.height) {
                    extracted = extracted.with_dimensions(w, h);
                }
                return Ok(extracted);
            }
        }

        if let Some(unsupported) = filters.iter().find(|f| !is_sample_filter(f)) {
            return Err(Error::resolution(
                xref,
                format!("unsupported image filter /{}", unsupported),
            ));
        }

        let layout = self.raster_layout(xref, &stream.dict)?;
        let samples = self
            .stream_data(stream)
            .map_err(|e| {
                Error::resolution(xref, format!("cannot decode [{}]: {}", filters.join(" "), e))
            })?;
        let png = pixels::encode_png(&layout, &samples)
            .map_err(|reason| Error::resolution(xref, reason))?;

        Ok(ExtractedImage::with_format(png, "png").with_dimensions(layout.width, layout.height))
    }
}

/// Filters whose output is a complete image file rather than raw samples.
fn passthrough_format(filter: &str) -> Option<&'static str> {
    match filter {
        "DCTDecode" | "DCT" => Some("jpeg"),
        "JPXDecode" => Some("jpx"),
        "JBIG2Decode" => Some("jb2"),
        _ => None,
    }
}

/// Filters lopdf can undo to get at raw samples.
fn is_sample_filter(filter: &str) -> bool {
    matches!(filter, "FlateDecode" | "LZWDecode" | "ASCII85Decode")
}

fn device_color_space(name: &[u8]) -> Option<ColorSpace> {
    match name {
        b"DeviceGray" | b"G" | b"CalGray" => Some(ColorSpace::Gray),
        b"DeviceRGB" | b"RGB" | b"CalRGB" => Some(ColorSpace::Rgb),
        b"DeviceCMYK" | b"CMYK" => Some(ColorSpace::Cmyk),
        _ => None,
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    fn single_page_doc(resources: Dictionary) -> (LopdfDocument, ObjectId) {
        let mut doc = LopdfDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Resources" => resources,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        (doc, page_id)
    }

    #[test]
    fn test_passthrough_format() {
        assert_eq!(passthrough_format("DCTDecode"), Some("jpeg"));
        assert_eq!(passthrough_format("JPXDecode"), Some("jpx"));
        assert_eq!(passthrough_format("FlateDecode"), None);
    }

    #[test]
    fn test_sample_filters() {
        assert!(is_sample_filter("FlateDecode"));
        assert!(is_sample_filter("LZWDecode"));
        assert!(!is_sample_filter("CCITTFaxDecode"));
        assert!(!is_sample_filter("DCTDecode"));
    }

    #[test]
    fn test_device_color_space() {
        assert_eq!(device_color_space(b"DeviceRGB"), Some(ColorSpace::Rgb));
        assert_eq!(device_color_space(b"G"), Some(ColorSpace::Gray));
        assert_eq!(device_color_space(b"Lab"), None);
    }

    #[test]
    fn test_indexed_color_space_parse() {
        let (doc, _) = single_page_doc(Dictionary::new());
        let backend = LopdfBackend::from_document(doc);
        let cs = Object::Array(vec![
            "Indexed".into(),
            "DeviceRGB".into(),
            1.into(),
            Object::string_literal(vec![0u8, 0, 0, 255, 255, 255]),
        ]);

        let (parsed, separation) = backend.color_space(Xref::new(1, 0), &cs, 0).unwrap();
        assert!(!separation);
        assert_eq!(
            parsed,
            ColorSpace::Indexed {
                base: Box::new(ColorSpace::Rgb),
                hival: 1,
                lookup: vec![0, 0, 0, 255, 255, 255],
            }
        );
    }

    #[test]
    fn test_separation_is_inverted_gray() {
        let (doc, _) = single_page_doc(Dictionary::new());
        let backend = LopdfBackend::from_document(doc);
        let cs = Object::Array(vec!["Separation".into(), "Spot".into(), "DeviceCMYK".into()]);
        let (parsed, separation) = backend.color_space(Xref::new(1, 0), &cs, 0).unwrap();
        assert_eq!(parsed, ColorSpace::Gray);
        assert!(separation);
    }

    #[test]
    fn test_decode_inverted() {
        let (doc, _) = single_page_doc(Dictionary::new());
        let backend = LopdfBackend::from_document(doc);
        let inverted = dictionary! { "Decode" => vec![1.into(), 0.into()] };
        let normal = dictionary! { "Decode" => vec![0.into(), 1.into()] };
        assert!(backend.decode_inverted(&inverted));
        assert!(!backend.decode_inverted(&normal));
        assert!(!backend.decode_inverted(&Dictionary::new()));
    }

    #[test]
    fn test_page_out_of_range() {
        let (doc, _) = single_page_doc(Dictionary::new());
        let backend = LopdfBackend::from_document(doc);
        assert_eq!(backend.page_count(), 1);
        assert!(backend.page_images(0).unwrap().is_empty());
        assert!(matches!(
            backend.page_images(1),
            Err(Error::PageOutOfRange(2, 1))
        ));
        assert!(matches!(
            backend.page_images(u32::MAX),
            Err(Error::PageOutOfRange(u32::MAX, 1))
        ));
    }

    #[test]
    fn test_non_image_xobject_rejected() {
        let (mut doc, _) = single_page_doc(Dictionary::new());
        let form_id = doc.add_object(Stream::new(
            dictionary! { "Type" => "XObject", "Subtype" => "Form" },
            b"q Q".to_vec(),
        ));
        let backend = LopdfBackend::from_document(doc);
        let err = backend
            .resolve_image(&ImageRef::new(form_id, "Fm0"))
            .unwrap_err();
        assert!(matches!(err, Error::ImageResolution { .. }));
    }

    #[test]
    fn test_load_bytes_rejects_non_pdf() {
        let err = LopdfBackend::load_bytes(b"GIF89a not a pdf").err().unwrap();
        assert!(err.is_document_open());
    }
}
