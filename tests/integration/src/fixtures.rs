//! Requests and payloads shared by the integration tests

use completion_gateway::{CompletionRequest, Message, ToolSpec};
use image::{DynamicImage, Rgba, RgbaImage};
use serde_json::{json, Value};

/// Schema for `{"answer": <integer>}`
pub fn answer_schema() -> Value {
    json!({
        "type": "object",
        "properties": {"answer": {"type": "integer"}},
        "required": ["answer"],
        "additionalProperties": false
    })
}

/// A plain question
pub fn simple_request(question: &str) -> CompletionRequest {
    CompletionRequest::builder()
        .message(Message::user(question))
        .build()
        .expect("valid request")
}

/// An arithmetic question demanding a schema-conforming answer
pub fn arithmetic_request() -> CompletionRequest {
    CompletionRequest::builder()
        .message(Message::system("You are a careful calculator."))
        .message(Message::user("What is 2 + 2?"))
        .json_schema("answer", answer_schema())
        .metric_key("arithmetic")
        .build()
        .expect("valid request")
}

/// Weather lookup tool
pub fn weather_tool() -> ToolSpec {
    ToolSpec::new("get_weather", "Look up the current weather").with_parameters(json!({
        "type": "object",
        "properties": {"city": {"type": "string"}},
        "required": ["city"]
    }))
}

/// A request that must call `get_weather`
pub fn weather_request() -> CompletionRequest {
    CompletionRequest::builder()
        .message(Message::user("What's the weather in Paris?"))
        .tool(weather_tool())
        .metric_key("weather")
        .build()
        .expect("valid request")
}

/// A solid-colour RGBA bitmap
pub fn solid_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([200, 30, 30, 255])))
}
