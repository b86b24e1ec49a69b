mod callstack;
mod engine;
mod flowchart;
mod llm;
mod parser;
mod prompts;

pub use engine::Engine;
pub use flowchart::FlowchartGraph;
pub use llm::AiGateway;
