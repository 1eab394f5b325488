use crate::arsc::cursor::ByteCursor;
use crate::arsc::error::{ArscError, ArscResult};
use log::warn;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/* Size thresholds: each optional group is present only when `size` reaches it */
pub const MIN_SIZE: u32 = 28;
pub const SCREEN_CONFIG_MIN_SIZE: u32 = 32;
pub const SCREEN_DP_MIN_SIZE: u32 = 36;
pub const LOCALE_MIN_SIZE: u32 = 48;
pub const SCREEN_CONFIG_EXTENSION_MIN_SIZE: u32 = 52;

/* Packed sub-fields */
pub const COLOR_MODE_WIDE_COLOR_GAMUT_MASK: u8 = 0x03;
pub const COLOR_MODE_WIDE_COLOR_GAMUT_NO: u8 = 0x01;
pub const COLOR_MODE_WIDE_COLOR_GAMUT_YES: u8 = 0x02;
pub const COLOR_MODE_HDR_MASK: u8 = 0x0C;
pub const COLOR_MODE_HDR_NO: u8 = 0x04;
pub const COLOR_MODE_HDR_YES: u8 = 0x08;
pub const DENSITY_DPI_UNDEFINED: u16 = 0;
pub const DENSITY_DPI_LDPI: u16 = 120;
pub const DENSITY_DPI_MDPI: u16 = 160;
pub const DENSITY_DPI_TVDPI: u16 = 213;
pub const DENSITY_DPI_HDPI: u16 = 240;
pub const DENSITY_DPI_XHDPI: u16 = 320;
pub const DENSITY_DPI_XXHDPI: u16 = 480;
pub const DENSITY_DPI_XXXHDPI: u16 = 640;
pub const DENSITY_DPI_ANY: u16 = 0xFFFE;
pub const DENSITY_DPI_NONE: u16 = 0xFFFF;
pub const KEYBOARD_NOKEYS: u8 = 1;
pub const KEYBOARD_QWERTY: u8 = 2;
pub const KEYBOARD_12KEY: u8 = 3;
pub const KEYBOARDHIDDEN_MASK: u8 = 0x03;
pub const KEYBOARDHIDDEN_NO: u8 = 1;
pub const KEYBOARDHIDDEN_YES: u8 = 2;
pub const KEYBOARDHIDDEN_SOFT: u8 = 3;
pub const NAVIGATION_NONAV: u8 = 1;
pub const NAVIGATION_DPAD: u8 = 2;
pub const NAVIGATION_TRACKBALL: u8 = 3;
pub const NAVIGATION_WHEEL: u8 = 4;
pub const NAVIGATIONHIDDEN_MASK: u8 = 0x0C;
pub const NAVIGATIONHIDDEN_NO: u8 = 0x04;
pub const NAVIGATIONHIDDEN_YES: u8 = 0x08;
pub const ORIENTATION_PORTRAIT: u8 = 0x01;
pub const ORIENTATION_LANDSCAPE: u8 = 0x02;
pub const SCREENLAYOUT_LAYOUTDIR_MASK: u8 = 0xC0;
pub const SCREENLAYOUT_LAYOUTDIR_LTR: u8 = 0x40;
pub const SCREENLAYOUT_LAYOUTDIR_RTL: u8 = 0x80;
pub const SCREENLAYOUT_LONG_MASK: u8 = 0x30;
pub const SCREENLAYOUT_LONG_NO: u8 = 0x10;
pub const SCREENLAYOUT_LONG_YES: u8 = 0x20;
pub const SCREENLAYOUT_ROUND_MASK: u8 = 0x03;
pub const SCREENLAYOUT_ROUND_NO: u8 = 0x01;
pub const SCREENLAYOUT_ROUND_YES: u8 = 0x02;
pub const SCREENLAYOUT_SIZE_MASK: u8 = 0x0F;
pub const SCREENLAYOUT_SIZE_SMALL: u8 = 0x01;
pub const SCREENLAYOUT_SIZE_NORMAL: u8 = 0x02;
pub const SCREENLAYOUT_SIZE_LARGE: u8 = 0x03;
pub const SCREENLAYOUT_SIZE_XLARGE: u8 = 0x04;
pub const TOUCHSCREEN_NOTOUCH: u8 = 1;
pub const TOUCHSCREEN_FINGER: u8 = 3;
pub const UI_MODE_NIGHT_MASK: u8 = 0x30;
pub const UI_MODE_NIGHT_NO: u8 = 0x10;
pub const UI_MODE_NIGHT_YES: u8 = 0x20;
pub const UI_MODE_TYPE_MASK: u8 = 0x0F;
pub const UI_MODE_TYPE_DESK: u8 = 0x02;
pub const UI_MODE_TYPE_CAR: u8 = 0x03;
pub const UI_MODE_TYPE_TELEVISION: u8 = 0x04;
pub const UI_MODE_TYPE_APPLIANCE: u8 = 0x05;
pub const UI_MODE_TYPE_WATCH: u8 = 0x06;
pub const UI_MODE_TYPE_VR_HEADSET: u8 = 0x07;

const LANGUAGE_BASE: u8 = 0x61;
const REGION_BASE: u8 = 0x30;

static DENSITY_NAMES: Lazy<HashMap<u16, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (DENSITY_DPI_LDPI, "ldpi"),
        (DENSITY_DPI_MDPI, "mdpi"),
        (DENSITY_DPI_TVDPI, "tvdpi"),
        (DENSITY_DPI_HDPI, "hdpi"),
        (DENSITY_DPI_XHDPI, "xhdpi"),
        (DENSITY_DPI_XXHDPI, "xxhdpi"),
        (DENSITY_DPI_XXXHDPI, "xxxhdpi"),
        (DENSITY_DPI_ANY, "anydpi"),
        (DENSITY_DPI_NONE, "nodpi"),
    ])
});

/// Name tables for the single-byte qualifier fields, keyed by the already-masked value.
static BYTE_NAMES: Lazy<HashMap<(QualifierKind, u8), &'static str>> = Lazy::new(|| {
    use QualifierKind::*;
    HashMap::from([
        ((ScreenLayoutDirection, SCREENLAYOUT_LAYOUTDIR_LTR), "ldltr"),
        ((ScreenLayoutDirection, SCREENLAYOUT_LAYOUTDIR_RTL), "ldrtl"),
        ((ScreenLayoutSize, SCREENLAYOUT_SIZE_SMALL), "small"),
        ((ScreenLayoutSize, SCREENLAYOUT_SIZE_NORMAL), "normal"),
        ((ScreenLayoutSize, SCREENLAYOUT_SIZE_LARGE), "large"),
        ((ScreenLayoutSize, SCREENLAYOUT_SIZE_XLARGE), "xlarge"),
        ((ScreenLayoutLong, SCREENLAYOUT_LONG_NO), "notlong"),
        ((ScreenLayoutLong, SCREENLAYOUT_LONG_YES), "long"),
        ((ScreenLayoutRound, SCREENLAYOUT_ROUND_NO), "notround"),
        ((ScreenLayoutRound, SCREENLAYOUT_ROUND_YES), "round"),
        ((ColorModeWideColorGamut, COLOR_MODE_WIDE_COLOR_GAMUT_NO), "nowidecg"),
        ((ColorModeWideColorGamut, COLOR_MODE_WIDE_COLOR_GAMUT_YES), "widecg"),
        ((ColorModeHdr, COLOR_MODE_HDR_NO), "lowdr"),
        ((ColorModeHdr, COLOR_MODE_HDR_YES), "highdr"),
        ((Orientation, ORIENTATION_PORTRAIT), "port"),
        ((Orientation, ORIENTATION_LANDSCAPE), "land"),
        ((UiModeType, UI_MODE_TYPE_DESK), "desk"),
        ((UiModeType, UI_MODE_TYPE_CAR), "car"),
        ((UiModeType, UI_MODE_TYPE_TELEVISION), "television"),
        ((UiModeType, UI_MODE_TYPE_APPLIANCE), "appliance"),
        ((UiModeType, UI_MODE_TYPE_WATCH), "watch"),
        ((UiModeType, UI_MODE_TYPE_VR_HEADSET), "vrheadset"),
        ((UiModeNight, UI_MODE_NIGHT_NO), "notnight"),
        ((UiModeNight, UI_MODE_NIGHT_YES), "night"),
        ((Touchscreen, TOUCHSCREEN_NOTOUCH), "notouch"),
        ((Touchscreen, TOUCHSCREEN_FINGER), "finger"),
        ((KeyboardHidden, KEYBOARDHIDDEN_NO), "keysexposed"),
        ((KeyboardHidden, KEYBOARDHIDDEN_YES), "keyshidden"),
        ((KeyboardHidden, KEYBOARDHIDDEN_SOFT), "keyssoft"),
        ((Keyboard, KEYBOARD_NOKEYS), "nokeys"),
        ((Keyboard, KEYBOARD_QWERTY), "qwerty"),
        ((Keyboard, KEYBOARD_12KEY), "12key"),
        ((NavigationHidden, NAVIGATIONHIDDEN_NO), "navexposed"),
        ((NavigationHidden, NAVIGATIONHIDDEN_YES), "navhidden"),
        ((Navigation, NAVIGATION_NONAV), "nonav"),
        ((Navigation, NAVIGATION_DPAD), "dpad"),
        ((Navigation, NAVIGATION_TRACKBALL), "trackball"),
        ((Navigation, NAVIGATION_WHEEL), "wheel"),
    ])
});

/// Qualifier kinds, in resource directory order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QualifierKind {
    Mcc,
    Mnc,
    Language,
    LocaleScript,
    Region,
    LocaleVariant,
    ScreenLayoutDirection,
    SmallestScreenWidthDp,
    ScreenWidthDp,
    ScreenHeightDp,
    ScreenLayoutSize,
    ScreenLayoutLong,
    ScreenLayoutRound,
    ColorModeWideColorGamut,
    ColorModeHdr,
    Orientation,
    UiModeType,
    UiModeNight,
    DensityDpi,
    Touchscreen,
    KeyboardHidden,
    Keyboard,
    NavigationHidden,
    Navigation,
    ScreenSize,
    SdkVersion,
}

/// Device configuration a resource value applies to (`ResTable_config`).
///
/// Fields past [`MIN_SIZE`] are only read when the declared `size` covers
/// them and stay zero otherwise. Bytes beyond the known layout are kept in
/// `unknown` so that newer records survive a decode unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceConfiguration {
    pub size: u32,
    pub mcc: u16,
    pub mnc: u16,
    pub language: [u8; 2],
    pub region: [u8; 2],
    pub orientation: u8,
    pub touchscreen: u8,
    pub density: u16,
    pub keyboard: u8,
    pub navigation: u8,
    pub input_flags: u8,
    pub screen_width: u16,
    pub screen_height: u16,
    pub sdk_version: u16,
    pub minor_version: u16,
    pub screen_layout: u8,
    pub ui_mode: u8,
    pub smallest_screen_width_dp: u16,
    pub screen_width_dp: u16,
    pub screen_height_dp: u16,
    pub locale_script: [u8; 4],
    pub locale_variant: [u8; 8],
    pub screen_layout2: u8,
    pub color_mode: u8,
    pub unknown: Vec<u8>,
}

impl Default for ResourceConfiguration {
    fn default() -> Self {
        ResourceConfiguration {
            size: Self::SIZE,
            mcc: 0,
            mnc: 0,
            language: [0; 2],
            region: [0; 2],
            orientation: 0,
            touchscreen: 0,
            density: 0,
            keyboard: 0,
            navigation: 0,
            input_flags: 0,
            screen_width: 0,
            screen_height: 0,
            sdk_version: 0,
            minor_version: 0,
            screen_layout: 0,
            ui_mode: 0,
            smallest_screen_width_dp: 0,
            screen_width_dp: 0,
            screen_height_dp: 0,
            locale_script: [0; 4],
            locale_variant: [0; 8],
            screen_layout2: 0,
            color_mode: 0,
            unknown: Vec::new(),
        }
    }
}

impl ResourceConfiguration {
    /// Size of the largest layout this decoder understands.
    pub const SIZE: u32 = SCREEN_CONFIG_EXTENSION_MIN_SIZE;

    pub fn read(cursor: &mut ByteCursor<'_>) -> ArscResult<Self> {
        let start = cursor.position();
        let size = cursor.read_u32().map_err(|_| ArscError::MalformedConfiguration {
            offset: start,
            reason: "missing size field".to_string(),
        })?;
        if size < MIN_SIZE {
            return Err(ArscError::MalformedConfiguration {
                offset: start,
                reason: format!("size {} below minimum {}", size, MIN_SIZE),
            });
        }
        if cursor.limit() < start + size as usize {
            return Err(ArscError::MalformedConfiguration {
                offset: start,
                reason: format!(
                    "size {} overruns limit 0x{:x}",
                    size,
                    cursor.limit()
                ),
            });
        }

        // Field order is wire order.
        let mut config = ResourceConfiguration {
            size,
            ..Default::default()
        };
        config.mcc = cursor.read_u16()?;
        config.mnc = cursor.read_u16()?;
        config.language = cursor.read_array()?;
        config.region = cursor.read_array()?;
        config.orientation = cursor.read_u8()?;
        config.touchscreen = cursor.read_u8()?;
        config.density = cursor.read_u16()?;
        config.keyboard = cursor.read_u8()?;
        config.navigation = cursor.read_u8()?;
        config.input_flags = cursor.read_u8()?;
        cursor.read_u8()?; // padding
        config.screen_width = cursor.read_u16()?;
        config.screen_height = cursor.read_u16()?;
        config.sdk_version = cursor.read_u16()?;
        config.minor_version = cursor.read_u16()?;

        if size >= SCREEN_CONFIG_MIN_SIZE {
            config.screen_layout = cursor.read_u8()?;
            config.ui_mode = cursor.read_u8()?;
            config.smallest_screen_width_dp = cursor.read_u16()?;
        }

        if size >= SCREEN_DP_MIN_SIZE {
            config.screen_width_dp = cursor.read_u16()?;
            config.screen_height_dp = cursor.read_u16()?;
        }

        if size >= LOCALE_MIN_SIZE {
            config.locale_script = cursor.read_array()?;
            config.locale_variant = cursor.read_array()?;
        }

        if size >= SCREEN_CONFIG_EXTENSION_MIN_SIZE {
            config.screen_layout2 = cursor.read_u8()?;
            config.color_mode = cursor.read_u8()?;
            cursor.read_u16()?; // reserved
        }

        let bytes_read = cursor.position() - start;
        let extra = size as usize - bytes_read;
        if extra > 0 {
            config.unknown = cursor.read_bytes(extra)?.to_vec();
            if config.unknown.iter().any(|b| *b != 0) {
                warn!(
                    "[config] {} unrecognised configuration bytes at 0x{:x} preserved",
                    extra,
                    start + bytes_read
                );
            }
        }
        Ok(config)
    }

    /// True when every field except `size` is zero, including any unknown bytes.
    pub fn is_default(&self) -> bool {
        let baseline = ResourceConfiguration {
            size: self.size,
            unknown: self.unknown.clone(),
            ..Default::default()
        };
        *self == baseline && self.unknown.iter().all(|b| *b == 0)
    }

    pub fn language_string(&self) -> String {
        unpack_language(self.language)
    }

    pub fn region_string(&self) -> String {
        unpack_region(self.region)
    }

    pub fn locale_script_string(&self) -> String {
        nul_trimmed(&self.locale_script)
    }

    pub fn locale_variant_string(&self) -> String {
        nul_trimmed(&self.locale_variant)
    }

    /// Qualifier parts keyed by kind; fields that are unset are omitted.
    pub fn qualifier_parts(&self) -> BTreeMap<QualifierKind, String> {
        use QualifierKind::*;
        let mut parts = BTreeMap::new();
        let mut named = |kind: QualifierKind, value: u8| {
            if let Some(name) = BYTE_NAMES.get(&(kind, value)) {
                parts.insert(kind, name.to_string());
            }
        };
        named(ScreenLayoutDirection, self.screen_layout & SCREENLAYOUT_LAYOUTDIR_MASK);
        named(ScreenLayoutSize, self.screen_layout & SCREENLAYOUT_SIZE_MASK);
        named(ScreenLayoutLong, self.screen_layout & SCREENLAYOUT_LONG_MASK);
        named(ScreenLayoutRound, self.screen_layout2 & SCREENLAYOUT_ROUND_MASK);
        named(ColorModeWideColorGamut, self.color_mode & COLOR_MODE_WIDE_COLOR_GAMUT_MASK);
        named(ColorModeHdr, self.color_mode & COLOR_MODE_HDR_MASK);
        named(Orientation, self.orientation);
        named(UiModeType, self.ui_mode & UI_MODE_TYPE_MASK);
        named(UiModeNight, self.ui_mode & UI_MODE_NIGHT_MASK);
        named(Touchscreen, self.touchscreen);
        named(KeyboardHidden, self.input_flags & KEYBOARDHIDDEN_MASK);
        named(Keyboard, self.keyboard);
        named(NavigationHidden, self.input_flags & NAVIGATIONHIDDEN_MASK);
        named(Navigation, self.navigation);

        if self.mcc != 0 {
            parts.insert(Mcc, format!("mcc{}", self.mcc));
        }
        if self.mnc != 0 {
            parts.insert(Mnc, format!("mnc{}", self.mnc));
        }
        let language = self.language_string();
        if !language.is_empty() {
            parts.insert(Language, language);
        }
        let script = self.locale_script_string();
        if !script.is_empty() {
            parts.insert(LocaleScript, format!("b+{}", script));
        }
        let region = self.region_string();
        if !region.is_empty() {
            parts.insert(Region, format!("r{}", region));
        }
        let variant = self.locale_variant_string();
        if !variant.is_empty() {
            parts.insert(LocaleVariant, variant);
        }
        if self.smallest_screen_width_dp != 0 {
            parts.insert(SmallestScreenWidthDp, format!("sw{}dp", self.smallest_screen_width_dp));
        }
        if self.screen_width_dp != 0 {
            parts.insert(ScreenWidthDp, format!("w{}dp", self.screen_width_dp));
        }
        if self.screen_height_dp != 0 {
            parts.insert(ScreenHeightDp, format!("h{}dp", self.screen_height_dp));
        }
        if self.density != DENSITY_DPI_UNDEFINED {
            let name = DENSITY_NAMES
                .get(&self.density)
                .map(|name| name.to_string())
                .unwrap_or_else(|| format!("{}dpi", self.density));
            parts.insert(DensityDpi, name);
        }
        if self.screen_width != 0 && self.screen_height != 0 {
            parts.insert(ScreenSize, format!("{}x{}", self.screen_width, self.screen_height));
        }
        if self.sdk_version != 0 {
            parts.insert(SdkVersion, format!("v{}", self.sdk_version));
        }
        parts
    }

    /// Qualifier strings in resource directory order, e.g. `["en", "rUS", "land"]`.
    pub fn qualifiers(&self) -> Vec<String> {
        self.qualifier_parts().into_values().collect()
    }
}

impl fmt::Display for ResourceConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = self.qualifiers();
        if parts.is_empty() {
            write!(f, "default")
        } else {
            write!(f, "{}", parts.join("-"))
        }
    }
}

fn nul_trimmed(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

fn unpack_language_or_region(value: [u8; 2], base: u8) -> String {
    if value == [0, 0] {
        return String::new();
    }
    if value[0] & 0x80 != 0 {
        let letters = [
            base + (value[1] & 0x1F),
            base + ((value[1] & 0xE0) >> 5) + ((value[0] & 0x03) << 3),
            base + ((value[0] & 0x7C) >> 2),
        ];
        return String::from_utf8_lossy(&letters).into_owned();
    }
    String::from_utf8_lossy(&value).into_owned()
}

fn pack_language_or_region(code: &str, base: u8) -> ArscResult<[u8; 2]> {
    let bytes = code.as_bytes();
    match bytes.len() {
        0 => Ok([0, 0]),
        2 => Ok([bytes[0], bytes[1]]),
        3 => {
            let mut letters = [0u8; 3];
            for (slot, byte) in letters.iter_mut().zip(bytes) {
                match byte.checked_sub(base) {
                    Some(v) if v < 0x20 => *slot = v,
                    _ => {
                        return Err(ArscError::MalformedConfiguration {
                            offset: 0,
                            reason: format!("cannot pack {:?} with base 0x{:02x}", code, base),
                        })
                    }
                }
            }
            Ok([
                (letters[2] << 2) | (letters[1] >> 3) | 0x80,
                letters[0] | (letters[1] << 5),
            ])
        }
        n => Err(ArscError::MalformedConfiguration {
            offset: 0,
            reason: format!("locale code {:?} has {} characters, expected 2 or 3", code, n),
        }),
    }
}

pub fn unpack_language(language: [u8; 2]) -> String {
    unpack_language_or_region(language, LANGUAGE_BASE)
}

pub fn unpack_region(region: [u8; 2]) -> String {
    unpack_language_or_region(region, REGION_BASE)
}

pub fn pack_language(language: &str) -> ArscResult<[u8; 2]> {
    pack_language_or_region(language, LANGUAGE_BASE)
}

pub fn pack_region(region: &str) -> ArscResult<[u8; 2]> {
    pack_language_or_region(region, REGION_BASE)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A config record of `size` bytes whose known fields hold recognisable values.
    fn record(size: u32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(&310u16.to_le_bytes()); // mcc
        out.extend_from_slice(&4u16.to_le_bytes()); // mnc
        out.extend_from_slice(b"en");
        out.extend_from_slice(b"US");
        out.push(ORIENTATION_LANDSCAPE);
        out.push(TOUCHSCREEN_FINGER);
        out.extend_from_slice(&DENSITY_DPI_HDPI.to_le_bytes());
        out.push(KEYBOARD_QWERTY);
        out.push(NAVIGATION_DPAD);
        out.push(KEYBOARDHIDDEN_NO | NAVIGATIONHIDDEN_YES);
        out.push(0);
        out.extend_from_slice(&1920u16.to_le_bytes());
        out.extend_from_slice(&1080u16.to_le_bytes());
        out.extend_from_slice(&21u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        assert_eq!(out.len(), MIN_SIZE as usize);
        // screen config
        out.push(SCREENLAYOUT_SIZE_LARGE | SCREENLAYOUT_LAYOUTDIR_RTL);
        out.push(UI_MODE_TYPE_CAR | UI_MODE_NIGHT_YES);
        out.extend_from_slice(&600u16.to_le_bytes());
        // screen dp
        out.extend_from_slice(&720u16.to_le_bytes());
        out.extend_from_slice(&1280u16.to_le_bytes());
        // locale
        out.extend_from_slice(b"Latn");
        out.extend_from_slice(b"posix\0\0\0");
        // extension
        out.push(SCREENLAYOUT_ROUND_YES);
        out.push(COLOR_MODE_HDR_YES);
        out.extend_from_slice(&[0, 0]);
        out.resize(size as usize, 0);
        out
    }

    fn decode(bytes: &[u8]) -> ResourceConfiguration {
        let mut cursor = ByteCursor::new(bytes);
        let config = ResourceConfiguration::read(&mut cursor).unwrap();
        assert_eq!(cursor.position(), config.size as usize);
        config
    }

    #[test]
    fn minimum_size_reads_base_fields_only() {
        let config = decode(&record(28));
        assert_eq!(config.size, 28);
        assert_eq!(config.mcc, 310);
        assert_eq!(config.mnc, 4);
        assert_eq!(config.language_string(), "en");
        assert_eq!(config.region_string(), "US");
        assert_eq!(config.density, DENSITY_DPI_HDPI);
        assert_eq!(config.sdk_version, 21);
        assert_eq!(config.screen_layout, 0);
        assert_eq!(config.ui_mode, 0);
        assert_eq!(config.smallest_screen_width_dp, 0);
        assert_eq!(config.screen_width_dp, 0);
        assert_eq!(config.locale_script, [0; 4]);
        assert_eq!(config.color_mode, 0);
        assert!(config.unknown.is_empty());
    }

    #[test]
    fn full_size_reads_every_field() {
        let config = decode(&record(52));
        assert_eq!(config.smallest_screen_width_dp, 600);
        assert_eq!(config.screen_width_dp, 720);
        assert_eq!(config.screen_height_dp, 1280);
        assert_eq!(config.locale_script_string(), "Latn");
        assert_eq!(config.locale_variant_string(), "posix");
        assert_eq!(config.screen_layout2, SCREENLAYOUT_ROUND_YES);
        assert_eq!(config.color_mode, COLOR_MODE_HDR_YES);
        assert!(config.unknown.is_empty());
    }

    #[test]
    fn intermediate_size_keeps_trailing_bytes() {
        let mut bytes = record(36);
        bytes[0..4].copy_from_slice(&40u32.to_le_bytes());
        bytes.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        let config = decode(&bytes);
        assert_eq!(config.smallest_screen_width_dp, 600);
        assert_eq!(config.screen_width_dp, 720);
        assert_eq!(config.screen_height_dp, 1280);
        assert_eq!(config.locale_script, [0; 4]);
        assert_eq!(config.locale_variant, [0; 8]);
        assert_eq!(config.unknown, vec![0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn future_size_preserves_unknown() {
        let mut bytes = record(52);
        bytes[0..4].copy_from_slice(&64u32.to_le_bytes());
        bytes.extend_from_slice(&[7; 12]);
        let config = decode(&bytes);
        assert_eq!(config.color_mode, COLOR_MODE_HDR_YES);
        assert_eq!(config.unknown, vec![7; 12]);
    }

    #[test]
    fn undersized_record_is_rejected() {
        let mut bytes = record(28);
        bytes[0..4].copy_from_slice(&24u32.to_le_bytes());
        let mut cursor = ByteCursor::new(&bytes);
        assert!(matches!(
            ResourceConfiguration::read(&mut cursor),
            Err(ArscError::MalformedConfiguration { offset: 0, .. })
        ));
    }

    #[test]
    fn oversized_record_is_rejected() {
        let mut bytes = record(28);
        bytes[0..4].copy_from_slice(&52u32.to_le_bytes());
        let mut cursor = ByteCursor::new(&bytes);
        assert!(matches!(
            ResourceConfiguration::read(&mut cursor),
            Err(ArscError::MalformedConfiguration { .. })
        ));
    }

    #[test]
    fn language_packing() {
        let packed = pack_language("eng").unwrap();
        assert_ne!(packed[0] & 0x80, 0);
        assert_eq!(unpack_language(packed), "eng");
        assert_eq!(pack_language("en").unwrap(), *b"en");
        assert_eq!(unpack_language([0, 0]), "");
        assert!(pack_language("engl").is_err());
        assert!(pack_language("EN1").is_err());
    }

    #[test]
    fn region_packing() {
        let packed = pack_region("419").unwrap();
        assert_eq!(unpack_region(packed), "419");
        assert_eq!(unpack_region(*b"US"), "US");
    }

    #[test]
    fn qualifier_string() {
        let config = decode(&record(52));
        assert_eq!(
            config.to_string(),
            "mcc310-mnc4-en-b+Latn-rUS-posix-ldrtl-sw600dp-w720dp-h1280dp-large-round-highdr-land-car-night-hdpi-finger-keysexposed-qwerty-navhidden-dpad-1920x1080-v21"
        );
        assert_eq!(ResourceConfiguration::default().to_string(), "default");
    }

    #[test]
    fn default_detection() {
        assert!(ResourceConfiguration::default().is_default());
        let sized = ResourceConfiguration {
            size: 28,
            unknown: vec![0, 0],
            ..Default::default()
        };
        assert!(sized.is_default());
        let with_unknown = ResourceConfiguration {
            unknown: vec![1],
            ..Default::default()
        };
        assert!(!with_unknown.is_default());
        assert!(!decode(&record(28)).is_default());
    }
}
