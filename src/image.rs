//! 2D and 3D images.

use std::os::raw::c_int;

use tracing::debug;

use crate::container::GenericContainer;
use crate::context::{require, HostContext};
use crate::error::{Error, Result};
use crate::ffi::{check_error, ImageFunctions, MBool, MImage, MInt, LIBRARY_MEMORY_ERROR};
use crate::kind::{ContainerKind, Image};
use crate::types::{ColorSpace, ImageDataType, ImageOptions};

/// An image handle with its ownership tag.
pub type GenericImage<'h> = GenericContainer<'h, Image>;

impl<'h> GenericContainer<'h, Image> {
    /// Allocate a new image.
    ///
    /// A 2D image is created when `options.slices` is 0, a 3D image
    /// otherwise. The new image is `CallerOwned`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use llink::{GenericImage, ImageOptions};
    /// # fn example(host: &llink::HostContext) -> llink::Result<()> {
    /// let image = GenericImage::new(host, ImageOptions {
    ///     width: 640,
    ///     height: 480,
    ///     channels: 3,
    ///     ..Default::default()
    /// })?;
    /// assert!(!image.is_3d());
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(host: &'h HostContext, options: ImageOptions) -> Result<Self> {
        if options.width < 0 || options.height < 0 || options.slices < 0 || options.channels <= 0 {
            return Err(Error::InvalidArgument(format!(
                "invalid image geometry: {}x{}x{} with {} channels",
                options.width, options.height, options.slices, options.channels
            )));
        }

        let table = host.image()?;
        let ty = c_int::from(options.data_type);
        let cs = c_int::from(options.color_space);
        let interleaved = MBool::from(options.interleaved);

        let mut raw = MImage::null();
        let code = if options.slices == 0 {
            let new_2d = require(table.new_2d, Image::KIND, "new_2d")?;
            unsafe {
                new_2d(
                    options.width,
                    options.height,
                    options.channels,
                    ty,
                    cs,
                    interleaved,
                    &mut raw,
                )
            }
        } else {
            let new_3d = require(table.new_3d, Image::KIND, "new_3d")?;
            unsafe {
                new_3d(
                    options.slices,
                    options.width,
                    options.height,
                    options.channels,
                    ty,
                    cs,
                    interleaved,
                    &mut raw,
                )
            }
        };
        check_error(code, |code| Error::NewFailed {
            kind: Image::KIND,
            code,
        })?;
        if raw.is_null() {
            return Err(Error::NewFailed {
                kind: Image::KIND,
                code: LIBRARY_MEMORY_ERROR,
            });
        }

        debug!(?raw, ?options, "allocated image");
        Ok(Self::from_fresh(host, raw))
    }

    /// Number of rows (the image height).
    pub fn rows(&self) -> MInt {
        self.read(|t| t.get_row_count)
    }

    /// Number of columns (the image width).
    pub fn columns(&self) -> MInt {
        self.read(|t| t.get_column_count)
    }

    /// Number of slices, 0 for a 2D image.
    pub fn slices(&self) -> MInt {
        self.read(|t| t.get_slice_count)
    }

    /// Number of channels per pixel.
    pub fn channels(&self) -> MInt {
        self.read(|t| t.get_channels)
    }

    /// Rank of the image, 2 or 3.
    pub fn rank(&self) -> MInt {
        self.read(|t| t.get_rank)
    }

    /// Check if this is a 3D image.
    pub fn is_3d(&self) -> bool {
        self.rank() == 3
    }

    /// Check if the last channel is an alpha channel.
    pub fn has_alpha_channel(&self) -> bool {
        self.read(|t| t.alpha_channel_q) != 0
    }

    /// Check if channel values of a pixel are stored together.
    pub fn is_interleaved(&self) -> bool {
        self.read(|t| t.interleaved_q) != 0
    }

    /// Color space, if the host reports a known one.
    pub fn color_space(&self) -> Option<ColorSpace> {
        if self.is_null() {
            return None;
        }
        ColorSpace::try_from(self.read(|t| t.get_color_space)).ok()
    }

    /// Pixel data type, if the host reports a known one.
    pub fn data_type(&self) -> Option<ImageDataType> {
        let code = self.query_type()?;
        c_int::try_from(code)
            .ok()
            .and_then(|code| ImageDataType::try_from(code).ok())
    }

    /// Total number of pixel values.
    pub fn flattened_length(&self) -> MInt {
        self.read(|t| t.get_flattened_length)
    }

    /// Convert to a new image with pixel type `ty`.
    ///
    /// The source is left untouched. The result is `CallerOwned`.
    pub fn convert(&self, ty: ImageDataType, interleaved: bool) -> Result<Self> {
        if self.is_null() {
            return Err(Error::InvalidArgument(
                "cannot convert an empty Image".to_string(),
            ));
        }
        let convert_type = require(self.host().image()?.convert_type, Image::KIND, "convert_type")?;

        let raw = unsafe { convert_type(self.raw(), c_int::from(ty), MBool::from(interleaved)) };
        if raw.is_null() {
            return Err(Error::ConversionFailed {
                kind: Image::KIND,
                reason: format!("to {:?} (interleaved: {})", ty, interleaved),
            });
        }

        debug!(source = ?self.raw(), ?raw, ?ty, interleaved, "converted image");
        Ok(Self::from_fresh(self.host(), raw))
    }

    fn read<T: Default>(
        &self,
        entry: impl FnOnce(&ImageFunctions) -> Option<unsafe extern "C" fn(MImage) -> T>,
    ) -> T {
        if self.is_null() {
            return T::default();
        }
        match self.host().image().ok().and_then(entry) {
            Some(f) => unsafe { f(self.raw()) },
            None => T::default(),
        }
    }
}
