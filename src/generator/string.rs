use serde::Deserialize;

use crate::error::BoxError;
use crate::node::TargetClass;
use crate::random::Random;
use crate::value::Value;

use super::{Generator, GeneratorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alphabet {
    #[default]
    Upper,
    Lower,
    Digits,
    Email,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StringGenerator {
    pub min_length: usize,
    pub max_length: usize,
    pub alphabet: Alphabet,
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CharGenerator;

impl StringGenerator {
    pub fn new(min_length: usize, max_length: usize) -> Self {
        Self { min_length, max_length, alphabet: Alphabet::Upper, prefix: None }
    }

    pub fn alphabet(mut self, alphabet: Alphabet) -> Self {
        self.alphabet = alphabet;
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn set_length(&mut self, min: Option<usize>, max: Option<usize>) {
        if let Some(min) = min {
            self.min_length = min;
        }
        if let Some(max) = max {
            self.max_length = max;
        }
        if self.max_length < self.min_length {
            self.max_length = self.min_length;
        }
    }
}

impl Generator for StringGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::String
    }

    fn generate(&self, random: &mut Random) -> Result<Value, BoxError> {
        let len = random.usize_range(self.min_length, self.max_length);
        let body = match self.alphabet {
            Alphabet::Upper => random.upper_string(len),
            Alphabet::Lower => random.lower_string(len),
            Alphabet::Digits => random.digits(len),
            Alphabet::Email => {
                let user = random.lower_string(len.max(1));
                let domain_len = random.usize_range(3, 8);
                let domain = random.lower_string(domain_len);
                format!("{user}@{domain}.com")
            }
        };
        Ok(Value::Str(match &self.prefix {
            Some(prefix) => format!("{prefix}{body}"),
            None => body,
        }))
    }

    fn target(&self) -> Option<TargetClass> {
        Some(TargetClass::String)
    }
}

impl Generator for CharGenerator {
    fn kind(&self) -> GeneratorKind {
        GeneratorKind::String
    }

    fn generate(&self, random: &mut Random) -> Result<Value, BoxError> {
        Ok(Value::Char(random.upper_char()))
    }

    fn target(&self) -> Option<TargetClass> {
        Some(TargetClass::Char)
    }
}
