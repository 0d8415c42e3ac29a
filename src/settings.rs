/// Whether a channel format is unsigned or signed.
///
/// Selects UNORM or SNORM for BC4 and BC5, and UF16 or SF16 for BC6H.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
pub enum Signedness {
    #[default]
    Unsigned,
    Signed,
}

impl Signedness {
    pub const fn is_signed(self) -> bool {
        matches!(self, Signedness::Signed)
    }
}

/// Encoding settings for BC1, BC2 and BC3.
#[cfg(feature = "bc15")]
#[cfg_attr(docsrs, doc(cfg(feature = "bc15")))]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BC15Settings {
    pub(crate) dither_rgb: bool,
    pub(crate) dither_alpha: bool,
    pub(crate) uniform: bool,
    pub(crate) alpha_threshold: f32,
}

#[cfg(feature = "bc15")]
impl BC15Settings {
    /// Perceptual channel weighting, no dithering.
    pub const fn basic() -> Self {
        Self {
            dither_rgb: false,
            dither_alpha: false,
            uniform: false,
            alpha_threshold: 0.5,
        }
    }

    /// Perceptual channel weighting with Floyd-Steinberg dithering of colour and alpha.
    pub const fn dithered() -> Self {
        Self {
            dither_rgb: true,
            dither_alpha: true,
            uniform: false,
            alpha_threshold: 0.5,
        }
    }

    /// Treats all colour channels equally. Useful for non-colour data like normal maps.
    pub const fn uniform() -> Self {
        Self {
            dither_rgb: false,
            dither_alpha: false,
            uniform: true,
            alpha_threshold: 0.5,
        }
    }

    /// Enables or disables dithering of the colour channels.
    pub const fn with_dither_rgb(mut self, dither: bool) -> Self {
        self.dither_rgb = dither;
        self
    }

    /// Enables or disables dithering of the BC2 alpha and of the BC1 colour key.
    pub const fn with_dither_alpha(mut self, dither: bool) -> Self {
        self.dither_alpha = dither;
        self
    }

    /// Switches between equal and perceptual weighting of the colour channels.
    pub const fn with_uniform(mut self, uniform: bool) -> Self {
        self.uniform = uniform;
        self
    }

    /// Pixels with an alpha below this value are encoded as transparent in BC1.
    pub const fn with_alpha_threshold(mut self, threshold: f32) -> Self {
        self.alpha_threshold = threshold;
        self
    }
}

#[cfg(feature = "bc15")]
impl Default for BC15Settings {
    fn default() -> Self {
        Self::basic()
    }
}

/// How many of the shapes of a partitioned mode are refined after they have
/// been sorted by their rough error estimate.
#[cfg(any(feature = "bc6h", feature = "bc7"))]
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
pub(crate) enum ShapeSearch {
    /// Only the best shape.
    Best,
    /// The best quarter of all shapes, at least one.
    #[default]
    Quarter,
    /// All shapes.
    All,
}

#[cfg(any(feature = "bc6h", feature = "bc7"))]
impl ShapeSearch {
    pub(crate) const fn candidates(self, shape_count: usize) -> usize {
        match self {
            ShapeSearch::Best => 1,
            ShapeSearch::Quarter => {
                let quarter = shape_count >> 2;
                if quarter > 1 {
                    quarter
                } else {
                    1
                }
            }
            ShapeSearch::All => shape_count,
        }
    }
}

/// Encoding settings for BC6H.
#[cfg(feature = "bc6h")]
#[cfg_attr(docsrs, doc(cfg(feature = "bc6h")))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct BC6HSettings {
    pub(crate) shape_search: ShapeSearch,
}

#[cfg(feature = "bc6h")]
impl BC6HSettings {
    /// Refines only the most promising shape of every mode.
    pub const fn very_fast() -> Self {
        Self {
            shape_search: ShapeSearch::Best,
        }
    }

    /// Refines the best quarter of all shapes of every mode.
    pub const fn basic() -> Self {
        Self {
            shape_search: ShapeSearch::Quarter,
        }
    }

    /// Refines every shape of every mode.
    pub const fn very_slow() -> Self {
        Self {
            shape_search: ShapeSearch::All,
        }
    }
}

#[cfg(feature = "bc6h")]
impl Default for BC6HSettings {
    fn default() -> Self {
        Self::basic()
    }
}

/// Encoding settings for BC7.
#[cfg(feature = "bc7")]
#[cfg_attr(docsrs, doc(cfg(feature = "bc7")))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct BC7Settings {
    pub(crate) shape_search: ShapeSearch,
    pub(crate) three_subsets: bool,
    pub(crate) mode6_only: bool,
}

#[cfg(feature = "bc7")]
#[cfg_attr(docsrs, doc(cfg(feature = "bc7")))]
impl BC7Settings {
    /// Only uses mode 6.
    pub const fn very_fast() -> Self {
        Self {
            shape_search: ShapeSearch::Best,
            three_subsets: false,
            mode6_only: true,
        }
    }

    /// All modes except the rarely chosen three subset modes 0 and 2.
    pub const fn fast() -> Self {
        Self {
            shape_search: ShapeSearch::Quarter,
            three_subsets: false,
            mode6_only: false,
        }
    }

    /// All modes, refining the best quarter of the shapes.
    pub const fn basic() -> Self {
        Self {
            shape_search: ShapeSearch::Quarter,
            three_subsets: true,
            mode6_only: false,
        }
    }

    /// All modes and all shapes.
    pub const fn very_slow() -> Self {
        Self {
            shape_search: ShapeSearch::All,
            three_subsets: true,
            mode6_only: false,
        }
    }
}

#[cfg(feature = "bc7")]
impl Default for BC7Settings {
    fn default() -> Self {
        Self::basic()
    }
}
