use crate::arsc::cursor::ByteCursor;
use crate::arsc::error::ArscResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of payload held in a [`ResourceValue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ResourceValueType {
    Null = 0x00,
    Reference = 0x01,
    Attribute = 0x02,
    String = 0x03,
    Float = 0x04,
    Dimension = 0x05,
    Fraction = 0x06,
    DynamicReference = 0x07,
    DynamicAttribute = 0x08,
    IntDec = 0x10,
    IntHex = 0x11,
    IntBoolean = 0x12,
    IntColorArgb8 = 0x1c,
    IntColorRgb8 = 0x1d,
    IntColorArgb4 = 0x1e,
    IntColorRgb4 = 0x1f,
}

impl ResourceValueType {
    pub fn from_code(code: u8) -> Option<Self> {
        use ResourceValueType::*;
        Some(match code {
            0x00 => Null,
            0x01 => Reference,
            0x02 => Attribute,
            0x03 => String,
            0x04 => Float,
            0x05 => Dimension,
            0x06 => Fraction,
            0x07 => DynamicReference,
            0x08 => DynamicAttribute,
            0x10 => IntDec,
            0x11 => IntHex,
            0x12 => IntBoolean,
            0x1c => IntColorArgb8,
            0x1d => IntColorRgb8,
            0x1e => IntColorArgb4,
            0x1f => IntColorRgb4,
            _ => return None,
        })
    }

    pub fn code(self) -> u8 {
        self as u8
    }
}

/// A typed 4-byte value (`Res_value`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceValue {
    pub size: u16,
    pub value_type: ResourceValueType,
    pub data: u32,
}

impl ResourceValue {
    /// Encoded size of a value in bytes.
    pub const SIZE: usize = 8;

    pub fn new(value_type: ResourceValueType, data: u32) -> Self {
        ResourceValue {
            size: Self::SIZE as u16,
            value_type,
            data,
        }
    }

    pub fn read(cursor: &mut ByteCursor<'_>) -> ArscResult<Self> {
        let start = cursor.position();
        let size = cursor.read_u16()?;
        cursor.read_u8()?; // res0
        let code = cursor.read_u8()?;
        let data = cursor.read_u32()?;
        let value_type = ResourceValueType::from_code(code)
            .ok_or_else(|| malformed!(start, "unknown resource value type 0x{:02x}", code))?;
        Ok(ResourceValue {
            size,
            value_type,
            data,
        })
    }

    pub fn with_data(&self, data: u32) -> Self {
        ResourceValue { data, ..*self }
    }
}

impl fmt::Display for ResourceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data;
        match self.value_type {
            ResourceValueType::Null => {
                write!(f, "{}", if data == 0 { "null" } else { "empty" })
            }
            ResourceValueType::Reference => write!(f, "ref(0x{data:08x})"),
            ResourceValueType::Attribute => write!(f, "attr(0x{data:08x})"),
            ResourceValueType::String => write!(f, "string(0x{data:08x})"),
            ResourceValueType::Float => write!(f, "float({})", data as i32),
            ResourceValueType::Dimension => write!(f, "dimen({})", data as i32),
            ResourceValueType::Fraction => write!(f, "frac({})", data as i32),
            ResourceValueType::DynamicReference => write!(f, "dynref(0x{data:08x})"),
            ResourceValueType::DynamicAttribute => write!(f, "dynattr(0x{data:08x})"),
            ResourceValueType::IntDec => write!(f, "dec({})", data as i32),
            ResourceValueType::IntHex => write!(f, "hex(0x{data:08x})"),
            ResourceValueType::IntBoolean => write!(f, "bool({})", data as i32),
            ResourceValueType::IntColorArgb8 => write!(f, "argb8(0x{data:08x})"),
            ResourceValueType::IntColorRgb8 => write!(f, "rgb8(0x{data:08x})"),
            ResourceValueType::IntColorArgb4 => write!(f, "argb4(0x{data:08x})"),
            ResourceValueType::IntColorRgb4 => write!(f, "rgb4(0x{data:08x})"),
        }
    }
}

/// A packed resource id: `package:8 | type:8 | entry:16`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceIdentifier(u32);

impl ResourceIdentifier {
    pub fn new(package_id: u8, type_id: u8, entry_id: u16) -> Self {
        ResourceIdentifier(((package_id as u32) << 24) | ((type_id as u32) << 16) | entry_id as u32)
    }

    pub fn from_raw(raw: u32) -> Self {
        ResourceIdentifier(raw)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }

    pub fn package_id(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub fn type_id(&self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub fn entry_id(&self) -> u16 {
        self.0 as u16
    }
}

impl From<u32> for ResourceIdentifier {
    fn from(value: u32) -> Self {
        ResourceIdentifier(value)
    }
}

impl fmt::Display for ResourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}
