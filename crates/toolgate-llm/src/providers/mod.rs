mod openai;

pub use openai::OpenAiProvider;
