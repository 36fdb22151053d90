// Researcher + reporting analyst, run one task after the other.

use crate::config::ModelConfig;
use crate::error::{Error, Result};
use crate::llm::{CompletionOptions, LlmClient};
use askama::Template;
use chrono::{Datelike, Local};
use std::path::Path;
use tracing::info;

pub const DEFAULT_TOPIC: &str = "AI LLMs";

#[derive(Debug, Clone)]
pub struct Agent {
    pub name: &'static str,
    pub role: String,
    pub goal: String,
    pub backstory: String,
}

impl Agent {
    fn system_prompt(&self) -> String {
        format!(
            "You are {}. {}\nYour personal goal is: {}",
            self.role, self.backstory, self.goal
        )
    }
}

#[derive(Debug, Clone)]
pub struct Task {
    pub name: &'static str,
    pub description: String,
    pub expected_output: String,
    /// Index into [`Crew::agents`].
    pub agent: usize,
}

impl Task {
    fn prompt(&self, context: Option<&str>) -> String {
        let mut prompt = format!(
            "Current Task: {}\n\nThis is the expected criteria for your final answer: {}\n\
             You MUST return the actual complete content as the final answer, not a summary.",
            self.description, self.expected_output
        );
        if let Some(context) = context {
            prompt.push_str("\n\nThis is the context you're working with:\n");
            prompt.push_str(context);
        }
        prompt
    }
}

/// Placeholder values substituted into agent and task text.
#[derive(Debug, Clone)]
pub struct CrewInputs {
    pub topic: String,
    pub current_year: i32,
}

impl CrewInputs {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            current_year: Local::now().year(),
        }
    }

    fn fill(&self, text: &str) -> String {
        text.replace("{topic}", &self.topic)
            .replace("{current_year}", &self.current_year.to_string())
    }
}

impl Default for CrewInputs {
    fn default() -> Self {
        Self::new(DEFAULT_TOPIC)
    }
}

#[derive(Debug, Clone)]
pub struct TaskOutput {
    pub task: &'static str,
    pub agent: &'static str,
    pub raw: String,
}

#[derive(Debug, Clone)]
pub struct Crew {
    pub agents: Vec<Agent>,
    pub tasks: Vec<Task>,
}

impl Crew {
    /// The research crew with `inputs` substituted.
    pub fn research(inputs: &CrewInputs) -> Self {
        let agents = vec![
            Agent {
                name: "researcher",
                role: inputs.fill("{topic} Senior Data Researcher"),
                goal: inputs.fill("Uncover cutting-edge developments in {topic}"),
                backstory: inputs.fill(
                    "You're a seasoned researcher with a knack for uncovering the latest \
                     developments in {topic}. Known for your ability to find the most relevant \
                     information and present it in a clear and concise manner.",
                ),
            },
            Agent {
                name: "reporting_analyst",
                role: inputs.fill("{topic} Reporting Analyst"),
                goal: inputs.fill(
                    "Create detailed reports based on {topic} data analysis and research findings",
                ),
                backstory: "You're a meticulous analyst with a keen eye for detail. You're known \
                            for your ability to turn complex data into clear and concise reports, \
                            making it easy for others to understand and act on the information \
                            you provide."
                    .into(),
            },
        ];
        let tasks = vec![
            Task {
                name: "research_task",
                description: inputs.fill(
                    "Conduct a thorough research about {topic}. Make sure you find any \
                     interesting and relevant information given the current year is \
                     {current_year}.",
                ),
                expected_output: inputs.fill(
                    "A list with 10 bullet points of the most relevant information about {topic}",
                ),
                agent: 0,
            },
            Task {
                name: "reporting_task",
                description: "Review the context you got and expand each topic into a full \
                              section for a report. Make sure the report is detailed and contains \
                              any and all relevant information."
                    .into(),
                expected_output: "A fully fledged report with the main topics, each with a full \
                                  section of information. Formatted as markdown without '```'"
                    .into(),
                agent: 1,
            },
        ];
        Self { agents, tasks }
    }

    /// Run every task in order, feeding each one the previous output.
    pub async fn kickoff(&self, llm: &LlmClient) -> Result<Vec<TaskOutput>> {
        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(self.tasks.len());

        for task in &self.tasks {
            let agent = self.agents.get(task.agent).ok_or_else(|| {
                Error::config(format!("task {} has no agent #{}", task.name, task.agent))
            })?;
            info!(task = task.name, agent = agent.name, "running task");

            let context = outputs.last().map(|o| o.raw.as_str());
            let raw = llm
                .complete(
                    Some(&agent.system_prompt()),
                    &task.prompt(context),
                    CompletionOptions::default(),
                )
                .await?;

            outputs.push(TaskOutput {
                task: task.name,
                agent: agent.name,
                raw,
            });
        }

        Ok(outputs)
    }
}

#[derive(Template)]
#[template(path = "crew_report.md", escape = "none")]
struct CrewReport<'a> {
    topic: &'a str,
    generated_at: String,
    model_key: &'a str,
    model_name: &'a str,
    body: &'a str,
}

pub fn render_report(inputs: &CrewInputs, model: &ModelConfig, body: &str) -> Result<String> {
    CrewReport {
        topic: &inputs.topic,
        generated_at: Local::now().format("%Y-%m-%d %H:%M").to_string(),
        model_key: &model.key,
        model_name: &model.name,
        body: body.trim(),
    }
    .render()
    .map_err(|e| Error::Template(e.to_string()))
}

/// Run the research crew and write the final task's output to `output_path`.
pub async fn run(
    model: &ModelConfig,
    inputs: &CrewInputs,
    output_path: &Path,
) -> Result<Vec<TaskOutput>> {
    let llm = LlmClient::from_model_config(model)?;
    let crew = Crew::research(inputs);
    let outputs = crew.kickoff(&llm).await?;

    if let Some(last) = outputs.last() {
        let report = render_report(inputs, model, &last.raw)?;
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(output_path, report)?;
        info!(path = %output_path.display(), "report written");
    }

    Ok(outputs)
}
