//! Type definitions, enums and option structs.

use std::os::raw::c_int;

use crate::error::Error;
use crate::ffi::{self, MInt, MReal};

/// Defines an enum mirroring a set of host type codes, with conversions both
/// ways. Unknown codes are rejected with [`Error::InvalidArgument`].
macro_rules! host_code_enum {
    (
        $(#[$doc:meta])*
        $name:ident: $repr:ty, $what:literal {
            $( $(#[$vdoc:meta])* $variant:ident = $code:path, )+
        }
    ) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vdoc])* $variant, )+
        }

        impl From<$name> for $repr {
            fn from(value: $name) -> $repr {
                match value {
                    $( $name::$variant => $code, )+
                }
            }
        }

        impl TryFrom<$repr> for $name {
            type Error = Error;

            fn try_from(code: $repr) -> Result<Self, Error> {
                match code {
                    $( c if c == $code => Ok($name::$variant), )+
                    other => Err(Error::InvalidArgument(format!(
                        concat!("unknown ", $what, " code {}"),
                        other
                    ))),
                }
            }
        }
    };
}

host_code_enum! {
    /// Element type of a tensor.
    TensorType: MInt, "tensor type" {
        /// Machine integers.
        Integer = ffi::MTYPE_INTEGER,
        /// Machine reals.
        Real = ffi::MTYPE_REAL,
        /// Complex numbers.
        Complex = ffi::MTYPE_COMPLEX,
    }
}

host_code_enum! {
    /// Element type of a numeric array.
    NumericArrayType: c_int, "numeric array type" {
        /// Signed 8-bit integers.
        Bit8 = ffi::MNUMERICARRAY_TYPE_BIT8,
        /// Unsigned 8-bit integers.
        UBit8 = ffi::MNUMERICARRAY_TYPE_UBIT8,
        /// Signed 16-bit integers.
        Bit16 = ffi::MNUMERICARRAY_TYPE_BIT16,
        /// Unsigned 16-bit integers.
        UBit16 = ffi::MNUMERICARRAY_TYPE_UBIT16,
        /// Signed 32-bit integers.
        Bit32 = ffi::MNUMERICARRAY_TYPE_BIT32,
        /// Unsigned 32-bit integers.
        UBit32 = ffi::MNUMERICARRAY_TYPE_UBIT32,
        /// Signed 64-bit integers.
        Bit64 = ffi::MNUMERICARRAY_TYPE_BIT64,
        /// Unsigned 64-bit integers.
        UBit64 = ffi::MNUMERICARRAY_TYPE_UBIT64,
        /// Single precision reals.
        Real32 = ffi::MNUMERICARRAY_TYPE_REAL32,
        /// Double precision reals.
        Real64 = ffi::MNUMERICARRAY_TYPE_REAL64,
        /// Single precision complex numbers.
        ComplexReal32 = ffi::MNUMERICARRAY_TYPE_COMPLEX_REAL32,
        /// Double precision complex numbers.
        ComplexReal64 = ffi::MNUMERICARRAY_TYPE_COMPLEX_REAL64,
    }
}

host_code_enum! {
    /// How values are mapped when a numeric array changes element type.
    ConversionMethod: c_int, "conversion method" {
        /// Fail if any value does not fit exactly.
        Check = ffi::MNUMERICARRAY_CONVERT_CHECK,
        /// Clip out-of-range values, fail on other mismatches.
        ClipCheck = ffi::MNUMERICARRAY_CONVERT_CLIP_CHECK,
        /// Coerce values, failing if not representable.
        Coerce = ffi::MNUMERICARRAY_CONVERT_COERCE,
        /// Clip, then coerce.
        ClipCoerce = ffi::MNUMERICARRAY_CONVERT_CLIP_COERCE,
        /// Round to the nearest representable value.
        Round = ffi::MNUMERICARRAY_CONVERT_ROUND,
        /// Clip, then round.
        ClipRound = ffi::MNUMERICARRAY_CONVERT_CLIP_ROUND,
        /// Scale into the destination range.
        Scale = ffi::MNUMERICARRAY_CONVERT_SCALE,
        /// Clip, then scale.
        ClipScale = ffi::MNUMERICARRAY_CONVERT_CLIP_SCALE,
    }
}

host_code_enum! {
    /// Pixel data type of an image.
    ImageDataType: c_int, "image data type" {
        /// 1 bit per channel.
        Bit = ffi::MIMAGE_TYPE_BIT,
        /// 8 bits per channel.
        Byte = ffi::MIMAGE_TYPE_BIT8,
        /// 16 bits per channel.
        Bit16 = ffi::MIMAGE_TYPE_BIT16,
        /// Single precision reals.
        Real32 = ffi::MIMAGE_TYPE_REAL32,
        /// Double precision reals.
        Real64 = ffi::MIMAGE_TYPE_REAL,
    }
}

host_code_enum! {
    /// Color space of an image.
    ColorSpace: c_int, "color space" {
        /// No color space.
        Undefined = ffi::MIMAGE_CS_UNDEFINED,
        /// Grayscale.
        Gray = ffi::MIMAGE_CS_GRAY,
        /// Red, green, blue.
        Rgb = ffi::MIMAGE_CS_RGB,
        /// Hue, saturation, brightness.
        Hsb = ffi::MIMAGE_CS_HSB,
        /// Cyan, magenta, yellow, black.
        Cmyk = ffi::MIMAGE_CS_CMYK,
        /// CIE XYZ.
        Xyz = ffi::MIMAGE_CS_XYZ,
        /// CIE LUV.
        Luv = ffi::MIMAGE_CS_LUV,
        /// CIE LAB.
        Lab = ffi::MIMAGE_CS_LAB,
        /// CIE LCH.
        Lch = ffi::MIMAGE_CS_LCH,
        /// Let the host pick from the channel count.
        Automatic = ffi::MIMAGE_CS_AUTOMATIC,
    }
}

impl Default for ConversionMethod {
    fn default() -> Self {
        ConversionMethod::ClipRound
    }
}

impl Default for ColorSpace {
    fn default() -> Self {
        ColorSpace::Automatic
    }
}

impl Default for ImageDataType {
    fn default() -> Self {
        ImageDataType::Byte
    }
}

/// Options for creating an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageOptions {
    /// Number of slices (0 for a 2D image).
    pub slices: MInt,
    /// Width in pixels (number of columns).
    pub width: MInt,
    /// Height in pixels (number of rows).
    pub height: MInt,
    /// Number of color channels (default: 1).
    pub channels: MInt,
    /// Pixel data type (default: Byte).
    pub data_type: ImageDataType,
    /// Color space (default: Automatic).
    pub color_space: ColorSpace,
    /// Whether channel values of a pixel are stored together.
    pub interleaved: bool,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            slices: 0,
            width: 1,
            height: 1,
            channels: 1,
            data_type: ImageDataType::default(),
            color_space: ColorSpace::default(),
            interleaved: true,
        }
    }
}

/// Options for converting a numeric array to another element type.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConversionOptions {
    /// Conversion method (default: ClipRound).
    pub method: ConversionMethod,
    /// Tolerance used by the method (default: 0.0).
    pub tolerance: MReal,
}
