//! Value objects shared by the request and response payloads.
//!
//! Every type here is a [`JsonRecord`](crate::json::JsonRecord) (or a tagged
//! union over records): plain values, cloned freely, that round-trip through
//! JSON and keep unrecognised keys in an extra bag.

mod conversation;
mod image;
mod include;
mod input;
mod message;
mod output;
mod prompt;
mod reasoning;
mod stream_options;

pub use conversation::Conversation;
pub use image::{ImageResponseData, ImageTokenDetails, ImageUsage};
pub use include::{Include, IncludeList};
pub use input::{Input, InputItem, InputItemList, ItemReference};
pub use message::{
    ContentPart, ImageDetail, InputFile, InputImage, InputText, ItemStatus, Message,
    MessageContent, OutputText, Refusal, Role,
};
pub use output::{ImageGenerationCall, ImageGenerationStatus, OutputItem, OutputItemList};
pub use prompt::Prompt;
pub use reasoning::{Reasoning, ReasoningEffort, ReasoningSummary};
pub use stream_options::StreamOptions;
