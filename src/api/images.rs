//! `POST /v1/images/generations`: image generation from a prompt.
//!
//! Range-constrained parameters are clamped rather than rejected. The limit on
//! `n` depends on the model, so it is re-applied whenever the model changes.

use super::Endpoint;
use crate::json::{wire_enum, JsonObject, JsonReader, JsonRecord, JsonWriter, WireEnum};
use crate::model::{ImageResponseData, ImageUsage};
use crate::request::{setters, update, Explicit, ExplicitSet, RequestCore, RequestData};

wire_enum! {
    /// Image models with their own parameter limits.
    pub enum ImageModel fallback DallE2 {
        DallE2 => "dall-e-2",
        DallE3 => "dall-e-3",
        GptImage1 => "gpt-image-1",
    }
}

wire_enum! {
    pub enum ImageSize fallback Auto {
        Auto => "auto",
        Square256 => "256x256",
        Square512 => "512x512",
        Square1024 => "1024x1024",
        Landscape1536 => "1536x1024",
        Portrait1536 => "1024x1536",
        Landscape1792 => "1792x1024",
        Portrait1792 => "1024x1792",
    }
}

wire_enum! {
    pub enum ImageQuality fallback Auto {
        Auto => "auto",
        Standard => "standard",
        Hd => "hd",
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

wire_enum! {
    /// Background transparency (GPT image models only).
    pub enum Background fallback Auto {
        Auto => "auto",
        Transparent => "transparent",
        Opaque => "opaque",
    }
}

wire_enum! {
    pub enum Moderation fallback Auto {
        Auto => "auto",
        Low => "low",
    }
}

wire_enum! {
    pub enum OutputFormat fallback Png {
        Png => "png",
        Jpeg => "jpeg",
        Webp => "webp",
    }
}

wire_enum! {
    /// Rendering style (DALL·E 3 only).
    pub enum ImageStyle fallback Vivid {
        Vivid => "vivid",
        Natural => "natural",
    }
}

wire_enum! {
    pub enum ResponseFormat fallback Url {
        Url => "url",
        B64Json => "b64_json",
    }
}

pub const MAX_IMAGES: u32 = 10;
pub const MAX_OUTPUT_COMPRESSION: u32 = 100;
pub const MAX_PARTIAL_IMAGES: u32 = 3;

/// Clamp an image count to what `model` supports.
pub fn clamp_n(n: u32, model: &str) -> u32 {
    match ImageModel::from_wire(model) {
        Some(ImageModel::DallE3) => 1,
        _ => n.clamp(1, MAX_IMAGES),
    }
}

/// Request parameters of the image generation endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    prompt: String,
    n: Option<u32>,
    size: Option<ImageSize>,
    quality: Option<ImageQuality>,
    background: Option<Background>,
    moderation: Option<Moderation>,
    output_format: Option<OutputFormat>,
    output_compression: Option<u32>,
    partial_images: Option<u32>,
    style: Option<ImageStyle>,
    response_format: Option<ResponseFormat>,
    user: String,
}

impl Endpoint for Params {
    type Body = ImagesResponse;

    const PATH: &'static str = "/v1/images/generations";
    const DEFAULT_MODEL: &'static str = "dall-e-2";

    fn read_json(
        &mut self,
        json: &mut JsonObject,
        explicit: &mut ExplicitSet,
        errors: &mut Vec<String>,
    ) -> bool {
        let mut reader = JsonReader::new("images request", json, errors);
        let mut mark = |name: &'static str, found: bool| {
            if found {
                explicit.apply(name, Explicit::Set);
            }
        };

        if let Some(prompt) = reader.string("prompt") {
            self.prompt = prompt;
            mark("prompt", true);
        }
        self.n = reader.u32("n");
        mark("n", self.n.is_some());
        self.size = reader.enumeration("size");
        mark("size", self.size.is_some());
        self.quality = reader.enumeration("quality");
        mark("quality", self.quality.is_some());
        self.background = reader.enumeration("background");
        mark("background", self.background.is_some());
        self.moderation = reader.enumeration("moderation");
        mark("moderation", self.moderation.is_some());
        self.output_format = reader.enumeration("output_format");
        mark("output_format", self.output_format.is_some());
        self.output_compression = reader.u32("output_compression");
        mark("output_compression", self.output_compression.is_some());
        self.partial_images = reader.u32("partial_images");
        mark("partial_images", self.partial_images.is_some());
        self.style = reader.enumeration("style");
        mark("style", self.style.is_some());
        self.response_format = reader.enumeration("response_format");
        mark("response_format", self.response_format.is_some());
        if let Some(user) = reader.string("user") {
            self.user = user;
            mark("user", true);
        }
        reader.finish()
    }

    fn write_json(&self, json: &mut JsonObject, full: bool) {
        let mut writer = JsonWriter::new(json, full);
        writer.string("prompt", &self.prompt);
        writer.optional("n", &self.n);
        writer.optional_enumeration("size", self.size);
        writer.optional_enumeration("quality", self.quality);
        writer.optional_enumeration("background", self.background);
        writer.optional_enumeration("moderation", self.moderation);
        writer.optional_enumeration("output_format", self.output_format);
        writer.optional("output_compression", &self.output_compression);
        writer.optional("partial_images", &self.partial_images);
        writer.optional_enumeration("style", self.style);
        writer.optional_enumeration("response_format", self.response_format);
        writer.string("user", &self.user);
    }

    fn normalize(&mut self, core: &RequestCore) {
        self.n = self.n.map(|n| clamp_n(n, core.model()));
        self.output_compression = self.output_compression.map(|c| c.min(MAX_OUTPUT_COMPRESSION));
        self.partial_images = self.partial_images.map(|p| p.min(MAX_PARTIAL_IMAGES));
    }

    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Image endpoint accessors on the request data.
impl RequestData<Params> {
    pub fn prompt(&self) -> &str {
        &self.params.prompt
    }

    pub fn n(&self) -> Option<u32> {
        self.params.n
    }

    pub fn size(&self) -> Option<ImageSize> {
        self.params.size
    }

    pub fn quality(&self) -> Option<ImageQuality> {
        self.params.quality
    }

    pub fn background(&self) -> Option<Background> {
        self.params.background
    }

    pub fn moderation(&self) -> Option<Moderation> {
        self.params.moderation
    }

    pub fn output_format(&self) -> Option<OutputFormat> {
        self.params.output_format
    }

    pub fn output_compression(&self) -> Option<u32> {
        self.params.output_compression
    }

    pub fn partial_images(&self) -> Option<u32> {
        self.params.partial_images
    }

    pub fn style(&self) -> Option<ImageStyle> {
        self.params.style
    }

    pub fn response_format(&self) -> Option<ResponseFormat> {
        self.params.response_format
    }

    pub fn user(&self) -> &str {
        &self.params.user
    }

    /// The model as a known image model, if it is one.
    pub fn image_model(&self) -> Option<ImageModel> {
        ImageModel::from_wire(self.model())
    }

    pub fn set_n(&mut self, n: impl Into<Option<u32>>) -> bool {
        self.set_n_with(n, Explicit::Set)
    }

    /// DALL·E 3 only generates one image per request; other models allow up to ten.
    pub fn set_n_with(&mut self, n: impl Into<Option<u32>>, explicit: Explicit) -> bool {
        let n = n.into().map(|n| clamp_n(n, self.model()));
        update(&mut self.params.n, n, &mut self.explicit, "n", explicit)
    }

    pub fn reset_n(&mut self) -> bool {
        self.set_n_with(None::<u32>, Explicit::Clear)
    }

    pub fn set_output_compression(&mut self, compression: impl Into<Option<u32>>) -> bool {
        self.set_output_compression_with(compression, Explicit::Set)
    }

    pub fn set_output_compression_with(
        &mut self,
        compression: impl Into<Option<u32>>,
        explicit: Explicit,
    ) -> bool {
        let compression = compression.into().map(|c| c.min(MAX_OUTPUT_COMPRESSION));
        update(
            &mut self.params.output_compression,
            compression,
            &mut self.explicit,
            "output_compression",
            explicit,
        )
    }

    pub fn reset_output_compression(&mut self) -> bool {
        self.set_output_compression_with(None::<u32>, Explicit::Clear)
    }

    pub fn set_partial_images(&mut self, partial_images: impl Into<Option<u32>>) -> bool {
        self.set_partial_images_with(partial_images, Explicit::Set)
    }

    pub fn set_partial_images_with(
        &mut self,
        partial_images: impl Into<Option<u32>>,
        explicit: Explicit,
    ) -> bool {
        let partial_images = partial_images.into().map(|p| p.min(MAX_PARTIAL_IMAGES));
        update(
            &mut self.params.partial_images,
            partial_images,
            &mut self.explicit,
            "partial_images",
            explicit,
        )
    }

    pub fn reset_partial_images(&mut self) -> bool {
        self.set_partial_images_with(None::<u32>, Explicit::Clear)
    }

    setters!(set_prompt, set_prompt_with, reset_prompt, params.prompt: String = String::new(), "prompt");
    setters!(set_size, set_size_with, reset_size, params.size: Option<ImageSize> = None::<ImageSize>, "size");
    setters!(set_quality, set_quality_with, reset_quality, params.quality: Option<ImageQuality> = None::<ImageQuality>, "quality");
    setters!(set_background, set_background_with, reset_background, params.background: Option<Background> = None::<Background>, "background");
    setters!(set_moderation, set_moderation_with, reset_moderation, params.moderation: Option<Moderation> = None::<Moderation>, "moderation");
    setters!(set_output_format, set_output_format_with, reset_output_format, params.output_format: Option<OutputFormat> = None::<OutputFormat>, "output_format");
    setters!(set_style, set_style_with, reset_style, params.style: Option<ImageStyle> = None::<ImageStyle>, "style");
    setters!(set_response_format, set_response_format_with, reset_response_format, params.response_format: Option<ResponseFormat> = None::<ResponseFormat>, "response_format");
    setters!(set_user, set_user_with, reset_user, params.user: String = String::new(), "user");
}

/// Body of an image generation reply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImagesResponse {
    pub created: i64,
    pub data: Vec<ImageResponseData>,
    pub background: Option<Background>,
    pub output_format: Option<OutputFormat>,
    pub quality: Option<ImageQuality>,
    pub size: Option<ImageSize>,
    pub usage: ImageUsage,
    extra: JsonObject,
}

impl JsonRecord for ImagesResponse {
    fn read_json(&mut self, json: &mut JsonObject, errors: &mut Vec<String>) -> bool {
        let mut reader = JsonReader::new("images response", json, errors);
        self.created = reader.i64("created").unwrap_or_default();
        self.data = reader.list("data").unwrap_or_default();
        self.background = reader.enumeration("background");
        self.output_format = reader.enumeration("output_format");
        self.quality = reader.enumeration("quality");
        self.size = reader.enumeration("size");
        self.usage = reader.record("usage").unwrap_or_default();
        reader.finish()
    }

    fn write_json(&self, json: &mut JsonObject, full: bool) {
        let mut writer = JsonWriter::new(json, full);
        writer.number("created", self.created, 0);
        writer.list("data", &self.data);
        writer.optional_enumeration("background", self.background);
        writer.optional_enumeration("output_format", self.output_format);
        writer.optional_enumeration("quality", self.quality);
        writer.optional_enumeration("size", self.size);
        writer.record("usage", &self.usage);
    }

    fn extra(&self) -> &JsonObject {
        &self.extra
    }

    fn extra_mut(&mut self) -> &mut JsonObject {
        &mut self.extra
    }

    fn is_empty(&self) -> bool {
        self.created == 0 && self.data.is_empty()
    }

    fn is_valid(&self) -> bool {
        !self.data.is_empty()
    }
}
