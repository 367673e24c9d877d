//! Prompt templates for the planning, report, and question-answering calls.

pub const PLANNER_SYSTEM_PROMPT: &str = r#"You are a research planner. Analyze the topic and create a research strategy.

Output JSON with this structure:
{
    "subtopics": ["subtopic1", "subtopic2", "subtopic3"],
    "search_queries": ["query1", "query2", "query3", "query4", "query5"]
}

Create:
- 3-5 subtopics (key areas to research)
- 5-8 search queries (specific, targeted, varied)

Make queries diverse: use questions, keywords, and different angles."#;

/// Appended to a system prompt when the response must be a bare JSON object.
pub const JSON_ONLY_INSTRUCTION: &str =
    "Respond with a single valid JSON object and nothing else. Do not wrap it in markdown.";

pub const SYNTHESIZER_SYSTEM_PROMPT: &str = r#"You are a research writer. Create a clear, comprehensive research report.

Structure:
1. Executive Summary (2-3 sentences)
2. Key Findings (5-7 points)
3. Detailed Analysis (3-4 paragraphs)
4. Sources (numbered list)

Rules:
- Use inline citations: [1], [2], etc.
- Synthesize across sources (don't just list facts)
- Note any contradictions
- Length: 500-800 words
- Professional but accessible tone"#;

pub const QA_SYSTEM_PROMPT: &str = r#"You are a research assistant. Answer questions using only the provided context.

Rules:
- Use ONLY information from context
- Include citations [1], [2] for facts
- Say "I don't have enough information" if context lacks the answer
- Be concise but complete"#;

pub fn planner_user_message(topic: &str) -> String {
    format!(
        "Research Topic: {}\n\nCreate a research plan. Return only valid JSON.",
        topic
    )
}

pub fn synthesizer_user_message(topic: &str, context: &str) -> String {
    format!(
        "Topic: {}\n\nResearch documents:\n{}\n\nWrite a comprehensive research report with inline citations.",
        topic, context
    )
}

pub fn qa_user_message(context: &str, question: &str) -> String {
    format!("Context:\n{}\n\nQuestion: {}\n\nAnswer:", context, question)
}
