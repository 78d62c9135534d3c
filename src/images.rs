//! Image Catalog
//!
//! Images are keyed by their bundle filename, which is always generated
//! from (type, density, locale), so each triple has at most one entry.
//! Dimensions are checked when an image is added; bytes are only read in
//! full when the bundle is assembled.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PassError, Result};
use crate::locale::normalize_locale;
use crate::pipeline::BundleMember;

/// Bytes needed to read a PNG's width and height.
pub const PNG_HEADER_LEN: usize = 24;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    Icon,
    Logo,
    Background,
    Footer,
    Strip,
    Thumbnail,
}

/// Size policy at 1x; scaled by the density factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeRule {
    AtLeast { width: u32, height: u32 },
    AtMost { width: u32, height: u32 },
}

impl ImageType {
    pub const ALL: [ImageType; 6] = [
        ImageType::Icon,
        ImageType::Logo,
        ImageType::Background,
        ImageType::Footer,
        ImageType::Strip,
        ImageType::Thumbnail,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ImageType::Icon => "icon",
            ImageType::Logo => "logo",
            ImageType::Background => "background",
            ImageType::Footer => "footer",
            ImageType::Strip => "strip",
            ImageType::Thumbnail => "thumbnail",
        }
    }

    pub fn size_rule(&self) -> SizeRule {
        match self {
            ImageType::Icon => SizeRule::AtLeast { width: 29, height: 29 },
            ImageType::Logo => SizeRule::AtMost { width: 160, height: 50 },
            ImageType::Background => SizeRule::AtMost { width: 180, height: 220 },
            ImageType::Footer => SizeRule::AtMost { width: 286, height: 15 },
            ImageType::Strip => SizeRule::AtMost { width: 375, height: 144 },
            ImageType::Thumbnail => SizeRule::AtMost { width: 90, height: 90 },
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, ImageType::Icon | ImageType::Logo)
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ImageType {
    type Err = PassError;

    fn from_str(s: &str) -> Result<Self> {
        ImageType::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| PassError::type_error(format!("Unknown image type {s}")))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Density {
    #[default]
    #[serde(rename = "1x")]
    X1,
    #[serde(rename = "2x")]
    X2,
    #[serde(rename = "3x")]
    X3,
}

impl Density {
    pub fn factor(&self) -> u32 {
        match self {
            Density::X1 => 1,
            Density::X2 => 2,
            Density::X3 => 3,
        }
    }

    /// Filename suffix; 1x has none.
    pub fn suffix(&self) -> &'static str {
        match self {
            Density::X1 => "",
            Density::X2 => "@2x",
            Density::X3 => "@3x",
        }
    }
}

impl FromStr for Density {
    type Err = PassError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "1x" => Ok(Density::X1),
            "2x" => Ok(Density::X2),
            "3x" => Ok(Density::X3),
            other => Err(PassError::type_error(format!("Invalid density {other}"))),
        }
    }
}

/// Where an image's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl From<PathBuf> for ImageSource {
    fn from(p: PathBuf) -> Self {
        Self::Path(p)
    }
}

impl From<&Path> for ImageSource {
    fn from(p: &Path) -> Self {
        Self::Path(p.to_path_buf())
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl ImageSource {
    /// Leading bytes only; a path is never read past `max`.
    pub fn read_header(&self, max: usize) -> Result<Vec<u8>> {
        match self {
            ImageSource::Bytes(b) => Ok(b[..b.len().min(max)].to_vec()),
            ImageSource::Path(p) => {
                let mut buf = Vec::with_capacity(max);
                File::open(p)?.take(max as u64).read_to_end(&mut buf)?;
                Ok(buf)
            }
        }
    }

    pub fn read_all(&self) -> Result<Vec<u8>> {
        match self {
            ImageSource::Bytes(b) => Ok(b.clone()),
            ImageSource::Path(p) => Ok(fs::read(p)?),
        }
    }
}

/// Width and height from a PNG signature + IHDR chunk.
pub fn png_dimensions(header: &[u8]) -> Option<(u32, u32)> {
    if header.len() < PNG_HEADER_LEN || header[..8] != PNG_SIGNATURE || &header[12..16] != b"IHDR" {
        return None;
    }
    let be = |at: usize| u32::from_be_bytes([header[at], header[at + 1], header[at + 2], header[at + 3]]);
    Some((be(16), be(20)))
}

/// Decoded form of an image filename.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageName {
    pub image_type: ImageType,
    pub density: Density,
    pub locale: Option<String>,
}

impl ImageName {
    /// `[<locale>.lproj/]<type>[@2x|@3x].png`
    pub fn filename(&self) -> String {
        let prefix = self
            .locale
            .as_ref()
            .map(|l| format!("{l}.lproj/"))
            .unwrap_or_default();
        format!("{prefix}{}{}.png", self.image_type, self.density.suffix())
    }
}

fn lproj_locale(dir_name: &str) -> Option<&str> {
    let lang = dir_name.strip_suffix(".lproj")?;
    let ok = !lang.is_empty() && lang.chars().all(|c| c.is_ascii_alphabetic() || c == '-' || c == '_');
    ok.then_some(lang)
}

/// Decode a filename or bundle path; anything that is not an image name
/// yields `None`.
pub fn parse_filename(name: &str) -> Option<ImageName> {
    let (dir, file) = match name.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, name),
    };
    let stem = file.strip_suffix(".png")?;
    let (type_name, density) = match stem.rsplit_once('@') {
        Some((t, "2x")) => (t, Density::X2),
        Some((t, "3x")) => (t, Density::X3),
        Some(_) => return None,
        None => (stem, Density::X1),
    };
    let image_type = type_name.parse().ok()?;
    let locale = match dir {
        None => None,
        Some(dir) => {
            let last = dir.rsplit('/').next().unwrap_or(dir);
            match lproj_locale(last) {
                Some(lang) => Some(normalize_locale(lang).ok()?),
                None => None,
            }
        }
    };
    Some(ImageName {
        image_type,
        density,
        locale,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    pub name: ImageName,
    pub width: u32,
    pub height: u32,
    pub source: ImageSource,
}

fn check_size(image_type: ImageType, density: Density, width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(PassError::image(image_type, format!("invalid size {width}x{height}")));
    }
    let k = density.factor();
    match image_type.size_rule() {
        SizeRule::AtLeast { width: w, height: h } => {
            if width < w * k {
                return Err(PassError::image(image_type, format!(
                    "{image_type} image must have width of at least {}px for {k}x density, received {width}px",
                    w * k
                )));
            }
            if height < h * k {
                return Err(PassError::image(image_type, format!(
                    "{image_type} image must have height of at least {}px for {k}x density, received {height}px",
                    h * k
                )));
            }
        }
        SizeRule::AtMost { width: w, height: h } => {
            if width > w * k {
                return Err(PassError::image(image_type, format!(
                    "{image_type} image must have width no larger than {}px for {k}x density, received {width}px",
                    w * k
                )));
            }
            if height > h * k {
                return Err(PassError::image(image_type, format!(
                    "{image_type} image must have height no larger than {}px for {k}x density, received {height}px",
                    h * k
                )));
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassImages {
    entries: BTreeMap<String, ImageEntry>,
}

impl PassImages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, filename: &str) -> Option<&ImageEntry> {
        self.entries.get(filename)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ImageEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn remove(&mut self, filename: &str) -> Option<ImageEntry> {
        self.entries.remove(filename)
    }

    /// Add an image after checking it is a PNG of acceptable size.
    /// Replaces any image with the same type, density and locale.
    pub fn add(
        &mut self,
        image_type: ImageType,
        source: impl Into<ImageSource>,
        density: Density,
        locale: Option<&str>,
    ) -> Result<&mut Self> {
        let source = source.into();
        let locale = locale.map(normalize_locale).transpose()?;
        let header = source.read_header(PNG_HEADER_LEN)?;
        let (width, height) = png_dimensions(&header)
            .ok_or_else(|| PassError::image(image_type, format!("image for \"{image_type}\" is not a PNG file")))?;
        check_size(image_type, density, width, height)?;

        let name = ImageName {
            image_type,
            density,
            locale,
        };
        let filename = name.filename();
        debug!(%filename, width, height, "image added");
        self.entries.insert(
            filename,
            ImageEntry {
                name,
                width,
                height,
                source,
            },
        );
        Ok(self)
    }

    /// `add` with the type and density given by name.
    pub fn add_named(
        &mut self,
        image_type: &str,
        source: impl Into<ImageSource>,
        density: Option<&str>,
        locale: Option<&str>,
    ) -> Result<&mut Self> {
        let image_type: ImageType = image_type.parse()?;
        let density = match density {
            Some(d) => d.parse().map_err(|_| {
                PassError::type_error(format!("Invalid density {d} for {image_type}"))
            })?,
            None => Density::X1,
        };
        self.add(image_type, source, density, locale)
    }

    /// Add every image found in `dir` and in its `<locale>.lproj`
    /// sub-directories. Files that are not image names are skipped.
    /// Nothing is added unless every image passes its checks.
    pub fn load(&mut self, dir: &Path) -> Result<&mut Self> {
        let mut found: Vec<(ImageName, PathBuf, Option<String>)> = vec![];

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let file_name = entry.file_name().to_string_lossy().into_owned();

            if entry.file_type()?.is_dir() {
                let Some(lang) = lproj_locale(&file_name) else {
                    debug!(dir = %path.display(), "skipping non-locale directory");
                    continue;
                };
                let lang = match normalize_locale(lang) {
                    Ok(lang) => lang,
                    Err(e) => {
                        warn!(dir = %path.display(), error = %e, "skipping locale directory");
                        continue;
                    }
                };
                for inner in fs::read_dir(&path)? {
                    let inner = inner?;
                    let inner_name = inner.file_name().to_string_lossy().into_owned();
                    let is_file = inner.file_type()?.is_file();
                    match parse_filename(&inner_name) {
                        Some(name) if is_file => {
                            found.push((name, inner.path(), Some(lang.clone())))
                        }
                        _ => debug!(file = %inner.path().display(), "skipping non-image file"),
                    }
                }
            } else {
                match parse_filename(&file_name) {
                    Some(name) => found.push((name, path, None)),
                    None => debug!(file = %path.display(), "skipping non-image file"),
                }
            }
        }

        // keys encode (type, density, locale), so the merge order is irrelevant
        let mut staged = PassImages::new();
        for (name, path, lang) in found {
            staged.add(name.image_type, path, name.density, lang.as_deref())?;
        }
        self.entries.extend(staged.entries);
        Ok(self)
    }

    /// Requires an icon and a logo, at any density or locale.
    pub fn validate(&self) -> Result<()> {
        for required in ImageType::ALL.iter().filter(|t| t.is_required()) {
            let suffix = format!("{required}.png");
            if !self.entries.keys().any(|k| k.ends_with(&suffix)) {
                return Err(PassError::MissingImage(suffix));
            }
        }
        Ok(())
    }

    /// Read every image into a bundle member.
    pub fn to_members(&self) -> Result<Vec<BundleMember>> {
        self.entries
            .iter()
            .map(|(path, entry)| {
                Ok(BundleMember {
                    path: path.clone(),
                    data: entry.source.read_all()?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Smallest byte string `png_dimensions` accepts for the given size.
    pub(crate) fn png_header(width: u32, height: u32) -> Vec<u8> {
        let mut v = PNG_SIGNATURE.to_vec();
        v.extend_from_slice(&13u32.to_be_bytes());
        v.extend_from_slice(b"IHDR");
        v.extend_from_slice(&width.to_be_bytes());
        v.extend_from_slice(&height.to_be_bytes());
        v.extend_from_slice(&[8, 6, 0, 0, 0, 0, 0, 0, 0]);
        v
    }

    #[test]
    fn test_filename_encoding() {
        let name = ImageName {
            image_type: ImageType::Logo,
            density: Density::X3,
            locale: Some("pt-BR".into()),
        };
        assert_eq!(name.filename(), "pt-BR.lproj/logo@3x.png");
        assert_eq!(parse_filename("pt_br.lproj/logo@3x.png"), Some(name));
        assert_eq!(
            parse_filename("icon.png").unwrap().density,
            Density::X1
        );
    }

    #[test]
    fn test_parse_rejects_non_images() {
        for name in ["icon.jpg", "icon@4x.png", "banner.png", "readme.txt", "icon@1x.png"] {
            assert_eq!(parse_filename(name), None, "{name}");
        }
    }

    #[test]
    fn test_icon_minimum_size() {
        let mut images = PassImages::new();
        let err = images
            .add(ImageType::Icon, png_header(28, 28), Density::X1, None)
            .unwrap_err();
        assert!(err.to_string().contains("29px"));
        images.add(ImageType::Icon, png_header(29, 29), Density::X1, None).unwrap();
        assert!(images.add(ImageType::Icon, png_header(29, 29), Density::X2, None).is_err());
        images.add(ImageType::Icon, png_header(58, 58), Density::X2, None).unwrap();
        assert_eq!(images.len(), 2);
    }

    #[test]
    fn test_logo_maximum_width() {
        let mut images = PassImages::new();
        let err = images
            .add(ImageType::Logo, png_header(161, 50), Density::X1, None)
            .unwrap_err();
        assert!(err.to_string().contains("160px"));
        images.add(ImageType::Logo, png_header(160, 50), Density::X1, None).unwrap();
        images.add(ImageType::Logo, png_header(320, 100), Density::X2, None).unwrap();
    }

    #[test]
    fn test_thumbnail_uses_published_bounds() {
        let mut images = PassImages::new();
        assert!(images.add(ImageType::Thumbnail, png_header(91, 90), Density::X1, None).is_err());
        assert!(images.add(ImageType::Thumbnail, png_header(90, 91), Density::X1, None).is_err());
        images.add(ImageType::Thumbnail, png_header(270, 270), Density::X3, None).unwrap();
    }

    #[test]
    fn test_rejects_non_png() {
        let mut images = PassImages::new();
        let err = images
            .add(ImageType::Icon, b"GIF89a............................".to_vec(), Density::X1, None)
            .unwrap_err();
        assert!(matches!(err, PassError::InvalidImage { .. }));
    }

    #[test]
    fn test_named_add_checks_type_and_density() {
        let mut images = PassImages::new();
        assert!(images.add_named("banner", png_header(10, 10), None, None).is_err());
        assert!(images.add_named("icon", png_header(29, 29), Some("4x"), None).is_err());
        images.add_named("icon", png_header(87, 87), Some("3x"), Some("fr")).unwrap();
        assert!(images.get("fr.lproj/icon@3x.png").is_some());
    }

    #[test]
    fn test_validate_requires_icon_and_logo() {
        let mut images = PassImages::new();
        images.add(ImageType::Icon, png_header(29, 29), Density::X1, None).unwrap();
        assert!(matches!(images.validate(), Err(PassError::MissingImage(ref n)) if n == "logo.png"));
        images.add(ImageType::Logo, png_header(320, 100), Density::X2, Some("de")).unwrap();
        assert!(images.validate().is_err());
        images.add(ImageType::Logo, png_header(100, 40), Density::X1, Some("de")).unwrap();
        images.validate().unwrap();
    }

    #[test]
    fn test_load_scans_locales_and_skips_other_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("icon.png"), png_header(29, 29)).unwrap();
        fs::write(dir.path().join("logo@2x.png"), png_header(300, 90)).unwrap();
        fs::write(dir.path().join("pass.json"), b"{}").unwrap();
        fs::create_dir(dir.path().join("en_GB.lproj")).unwrap();
        fs::write(dir.path().join("en_GB.lproj/strip.png"), png_header(375, 100)).unwrap();
        fs::write(dir.path().join("en_GB.lproj/pass.strings"), b"").unwrap();
        fs::create_dir(dir.path().join("misc")).unwrap();
        fs::write(dir.path().join("misc/thumbnail.png"), png_header(90, 90)).unwrap();

        let mut images = PassImages::new();
        images.load(dir.path()).unwrap();
        let names: Vec<_> = images.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(names, ["en-GB.lproj/strip.png", "icon.png", "logo@2x.png"]);
        // only a 2x logo was found
        assert!(matches!(images.validate(), Err(PassError::MissingImage(ref n)) if n == "logo.png"));
    }

    #[test]
    fn test_load_is_all_or_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("icon.png"), png_header(29, 29)).unwrap();
        fs::write(dir.path().join("logo.png"), png_header(999, 999)).unwrap();

        let mut images = PassImages::new();
        images.add(ImageType::Thumbnail, png_header(90, 90), Density::X1, None).unwrap();
        let err = images.load(dir.path()).unwrap_err();
        assert!(matches!(err, PassError::InvalidImage { .. }));
        let names: Vec<_> = images.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(names, ["thumbnail.png"]);
    }

    #[test]
    fn test_members_read_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("icon.png");
        let mut data = png_header(40, 40);
        data.extend_from_slice(b"rest-of-file");
        fs::write(&path, &data).unwrap();

        let mut images = PassImages::new();
        images.add(ImageType::Icon, path.as_path(), Density::X1, None).unwrap();
        let members = images.to_members().unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].path, "icon.png");
        assert_eq!(members[0].data, data);
    }
}
