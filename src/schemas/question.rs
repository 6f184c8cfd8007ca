use serde::{Deserialize, Serialize};

/// Languages the code editor and the execution sandbox agree on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Cpp,
    C,
    Java,
    Python,
    Javascript,
}

impl Language {
    pub fn label(self) -> &'static str {
        match self {
            Language::Cpp => "C++",
            Language::C => "C",
            Language::Java => "Java",
            Language::Python => "Python",
            Language::Javascript => "JavaScript",
        }
    }

    /// Runtime identifier and version the sandbox expects for this language.
    pub fn sandbox_runtime(self) -> (&'static str, &'static str) {
        match self {
            Language::Cpp => ("c++", "10.2.0"),
            Language::C => ("c", "10.2.0"),
            Language::Java => ("java", "15.0.2"),
            Language::Python => ("python", "3.10.0"),
            Language::Javascript => ("javascript", "18.15.0"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub order_index: u32,
    #[serde(default)]
    pub marks: u32,
    pub title: String,
    #[serde(flatten)]
    pub body: QuestionBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Question payload keyed by the wire `type` discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QuestionBody {
    #[serde(rename = "MCQ")]
    Mcq { content: McqContent },
    #[serde(rename = "CODING")]
    Coding {
        content: CodingContent,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        execution: Option<ExecutionSpec>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McqContent {
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodingContent {
    pub question: String,
    #[serde(default, rename = "codeTemplates")]
    pub code_templates: Vec<CodeTemplate>,
    #[serde(default, rename = "ioMode", skip_serializing_if = "Option::is_none")]
    pub io_mode: Option<IoMode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeTemplate {
    pub language: Language,
    pub template: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IoMode {
    Stdin,
    Function,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSpec {
    pub constraints: ExecutionConstraints,
    #[serde(default, rename = "testCases")]
    pub test_cases: Vec<TestCase>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionConstraints {
    #[serde(rename = "timeLimitMs")]
    pub time_limit_ms: u64,
    #[serde(rename = "memoryLimitMb")]
    pub memory_limit_mb: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: String,
    #[serde(rename = "expectedOutput")]
    pub expected_output: String,
    #[serde(default, rename = "isHidden")]
    pub is_hidden: bool,
}
