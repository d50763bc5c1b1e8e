//! Synchronous command handlers: `!ask`, `!choice`, `!calc`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

use super::calc;

/// Reply when `!ask` has no question.
pub const ASK_PROMPT: &str = "Введите вопрос";
/// Reply when `!choice` has fewer than two options.
pub const CHOICE_TOO_FEW: &str = "Количество вариантов должно быть больше одного";
/// Reply when `!calc` has no expression.
pub const CALC_PROMPT: &str = "Введите пример, например \"2+2\"";

const YES: &str = "Да";
const NO: &str = "Нет";

/// Options for [`ask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AskOptions {
    /// Seed the draw with the question so equal questions agree.
    pub random: bool,
    /// Wrap the answer in a full sentence.
    pub full_answer: bool,
}

impl Default for AskOptions {
    fn default() -> Self {
        Self {
            random: true,
            full_answer: true,
        }
    }
}

/// Answer a yes/no question.
///
/// With `random` set the generator is seeded from the SHA-256 of the
/// question, so the same text always gets the same answer.
#[must_use]
pub fn ask(question: &str, options: AskOptions) -> String {
    if question.is_empty() {
        return ASK_PROMPT.to_owned();
    }

    let draw: f64 = if options.random {
        let seed: [u8; 32] = Sha256::digest(question.as_bytes()).into();
        StdRng::from_seed(seed).random()
    } else {
        rand::rng().random()
    };
    let answer = if draw < 0.5 { YES } else { NO };

    if options.full_answer {
        format!("Ответ на вопрос {question} - {answer}")
    } else {
        answer.to_owned()
    }
}

/// Pick one of `options` uniformly at random.
#[must_use]
pub fn choice<S: AsRef<str>>(options: &[S]) -> String {
    if options.len() < 2 {
        return CHOICE_TOO_FEW.to_owned();
    }
    let index = rand::rng().random_range(0..options.len());
    options[index].as_ref().to_owned()
}

/// Evaluate an arithmetic expression; failures become a reply string.
#[must_use]
pub fn calc(expression: &str) -> String {
    if expression.trim().is_empty() {
        return CALC_PROMPT.to_owned();
    }

    match calc::evaluate(expression) {
        Ok(value) => calc::format_number(value),
        Err(err) => format!("Ошибка: {err}"),
    }
}
