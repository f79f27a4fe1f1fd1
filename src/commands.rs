// Command table. Every subcommand is a row: its name, the options it
// requires, the option a batch input line fills in, and the view used to
// print its response. Dispatch to the client is a single match.

use crate::api::{ApiClient, ApiError, AskRequest, SearchRequest, ServiceResponse};
use crate::render::{default_view, ViewFn, ViewOptions};
use crate::views;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    ListSystems,
    GetSystem,
    ListLlms,
    Ask,
    ListQuestions,
    GetQuestion,
    Search,
}

/// Options that vary between commands, after the config-file overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOptions {
    pub system_id: Option<String>,
    pub llm_id: Option<String>,
    /// Question text for `ask`, query text for `search`.
    pub question: Option<String>,
    pub question_id: Option<String>,
    pub filter: Option<String>,
    pub query_plan: Option<String>,
    pub properties: Option<String>,
    pub show_probe: bool,
}

/// An option a command may require or take from an input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    SystemId,
    LlmId,
    Question,
    QuestionId,
}

impl Field {
    pub fn flag(self) -> &'static str {
        match self {
            Field::SystemId => "--system",
            Field::LlmId => "--llm",
            Field::Question => "--question",
            Field::QuestionId => "--question-id",
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Field::SystemId => "a QnA system id",
            Field::LlmId => "an LLM provider id",
            Field::Question => "question text",
            Field::QuestionId => "a question id",
        }
    }

    pub fn get(self, opts: &CommandOptions) -> Option<&str> {
        let value = match self {
            Field::SystemId => &opts.system_id,
            Field::LlmId => &opts.llm_id,
            Field::Question => &opts.question,
            Field::QuestionId => &opts.question_id,
        };
        value.as_deref().filter(|v| !v.is_empty())
    }

    pub fn set(self, opts: &mut CommandOptions, value: &str) {
        let slot = match self {
            Field::SystemId => &mut opts.system_id,
            Field::LlmId => &mut opts.llm_id,
            Field::Question => &mut opts.question,
            Field::QuestionId => &mut opts.question_id,
        };
        *slot = Some(value.to_string());
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{command}: {} must be specified using the {} option", .field.describe(), .field.flag())]
pub struct OptionError {
    pub command: &'static str,
    pub field: Field,
}

pub struct CommandDescriptor {
    pub kind: CommandKind,
    pub name: &'static str,
    pub required: &'static [Field],
    /// Option filled by each line of an input file. A required field equal
    /// to this one is satisfied by the input file.
    pub input: Option<Field>,
    pub view: ViewFn,
}

pub static COMMANDS: [CommandDescriptor; 7] = [
    CommandDescriptor {
        kind: CommandKind::ListSystems,
        name: "list-systems",
        required: &[],
        input: None,
        view: default_view,
    },
    CommandDescriptor {
        kind: CommandKind::GetSystem,
        name: "get-system",
        required: &[Field::SystemId],
        input: Some(Field::SystemId),
        view: views::system,
    },
    CommandDescriptor {
        kind: CommandKind::ListLlms,
        name: "list-llms",
        required: &[Field::SystemId],
        input: None,
        view: default_view,
    },
    CommandDescriptor {
        kind: CommandKind::Ask,
        name: "ask",
        required: &[Field::SystemId, Field::LlmId, Field::Question],
        input: Some(Field::Question),
        view: views::answer,
    },
    CommandDescriptor {
        kind: CommandKind::ListQuestions,
        name: "list-questions",
        required: &[Field::SystemId],
        input: None,
        view: default_view,
    },
    CommandDescriptor {
        kind: CommandKind::GetQuestion,
        name: "get-questions",
        required: &[Field::SystemId, Field::QuestionId],
        input: Some(Field::QuestionId),
        view: views::question_detail,
    },
    CommandDescriptor {
        kind: CommandKind::Search,
        name: "search",
        required: &[Field::SystemId, Field::Question],
        input: Some(Field::Question),
        view: views::search_results,
    },
];

impl CommandKind {
    pub fn descriptor(self) -> &'static CommandDescriptor {
        let row = match self {
            CommandKind::ListSystems => 0,
            CommandKind::GetSystem => 1,
            CommandKind::ListLlms => 2,
            CommandKind::Ask => 3,
            CommandKind::ListQuestions => 4,
            CommandKind::GetQuestion => 5,
            CommandKind::Search => 6,
        };
        &COMMANDS[row]
    }
}

impl CommandDescriptor {
    /// Check required options before any network call.
    pub fn validate(&self, opts: &CommandOptions, has_input_file: bool) -> Result<(), OptionError> {
        for &field in self.required {
            let from_file = has_input_file && self.input == Some(field);
            if field.get(opts).is_none() && !from_file {
                return Err(OptionError {
                    command: self.name,
                    field,
                });
            }
        }
        Ok(())
    }

    /// Options for one input line. Commands without an input slot are
    /// re-run unchanged.
    pub fn with_input(&self, opts: &CommandOptions, line: &str) -> CommandOptions {
        let mut next = opts.clone();
        if let Some(field) = self.input {
            field.set(&mut next, line);
        }
        next
    }

    pub fn view_options(&self, opts: &CommandOptions) -> ViewOptions {
        ViewOptions {
            show_probe: opts.show_probe,
        }
    }

    /// Issue the call this command maps to.
    pub fn invoke(&self, client: &ApiClient, opts: &CommandOptions) -> Result<ServiceResponse, ApiError> {
        let system_id = Field::SystemId.get(opts).unwrap_or_default();
        match self.kind {
            CommandKind::ListSystems => client.list_systems(),
            CommandKind::GetSystem => client.get_system(system_id),
            CommandKind::ListLlms => client.list_llms(system_id),
            CommandKind::Ask => client.ask_question(&AskRequest {
                system_id,
                llm_provider_id: Field::LlmId.get(opts).unwrap_or_default(),
                question: Field::Question.get(opts).unwrap_or_default(),
                filter: opts.filter.as_deref(),
                query_plan: opts.query_plan.as_deref(),
                properties: opts.properties.as_deref(),
            }),
            CommandKind::ListQuestions => client.list_questions(system_id),
            CommandKind::GetQuestion => {
                client.get_question(system_id, Field::QuestionId.get(opts).unwrap_or_default())
            }
            CommandKind::Search => client.search(&SearchRequest {
                system_id,
                query: Field::Question.get(opts).unwrap_or_default(),
                filter: opts.filter.as_deref(),
                query_plan: opts.query_plan.as_deref(),
                properties: opts.properties.as_deref(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(system: Option<&str>, llm: Option<&str>, question: Option<&str>) -> CommandOptions {
        CommandOptions {
            system_id: system.map(str::to_string),
            llm_id: llm.map(str::to_string),
            question: question.map(str::to_string),
            ..CommandOptions::default()
        }
    }

    #[test]
    fn every_kind_has_its_own_row() {
        for row in &COMMANDS {
            assert_eq!(row.kind.descriptor().kind, row.kind);
            assert_eq!(row.kind.descriptor().name, row.name);
        }
        assert_eq!(CommandKind::Search.descriptor().name, "search");
        assert_eq!(CommandKind::GetQuestion.descriptor().name, "get-questions");
    }

    #[test]
    fn ask_requires_system_llm_and_question() {
        let ask = CommandKind::Ask.descriptor();
        assert!(ask.validate(&opts(Some("s"), Some("l"), Some("q")), false).is_ok());

        let err = ask.validate(&opts(None, Some("l"), Some("q")), false).unwrap_err();
        assert_eq!(err.field, Field::SystemId);
        let err = ask.validate(&opts(Some("s"), None, Some("q")), false).unwrap_err();
        assert_eq!(err.field, Field::LlmId);
        assert_eq!(
            err.to_string(),
            "ask: an LLM provider id must be specified using the --llm option"
        );
    }

    #[test]
    fn input_file_satisfies_only_the_input_field() {
        let ask = CommandKind::Ask.descriptor();
        assert!(ask.validate(&opts(Some("s"), Some("l"), None), true).is_ok());
        assert!(ask.validate(&opts(None, Some("l"), None), true).is_err());

        let get_system = CommandKind::GetSystem.descriptor();
        assert!(get_system.validate(&CommandOptions::default(), true).is_ok());
        assert!(get_system.validate(&CommandOptions::default(), false).is_err());
    }

    #[test]
    fn empty_values_count_as_missing() {
        let llms = CommandKind::ListLlms.descriptor();
        assert!(llms.validate(&opts(Some(""), None, None), false).is_err());
        assert!(CommandKind::ListSystems
            .descriptor()
            .validate(&CommandOptions::default(), false)
            .is_ok());
    }

    #[test]
    fn input_line_fills_the_slot() {
        let base = opts(Some("s"), Some("l"), None);
        let next = CommandKind::Ask.descriptor().with_input(&base, "What is X?");
        assert_eq!(next.question.as_deref(), Some("What is X?"));
        assert_eq!(next.system_id.as_deref(), Some("s"));

        let unchanged = CommandKind::ListQuestions.descriptor().with_input(&base, "ignored");
        assert_eq!(unchanged, base);
    }
}
