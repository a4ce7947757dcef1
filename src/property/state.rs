//! Attribute set structure and operations

use crate::config::EventEffect;
use serde::Serialize;

/// Attribute codes understood by conditions and effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeCode {
    /// 顏值 (Appearance)
    Chr,
    /// 智力 (Intelligence)
    Int,
    /// 體質 (Physique)
    Str,
    /// 家境 (Wealth)
    Mny,
    /// 快樂 (Happiness)
    Spr,
    /// 生命 (Life)
    Lif,
    /// Event history
    Evt,
    /// Current age, owned by the session rather than the attribute set
    Age,
}

impl AttributeCode {
    /// The five attributes handed out at allocation, in manual-input order
    pub const ALLOCATABLE: [AttributeCode; 5] = [
        AttributeCode::Chr,
        AttributeCode::Int,
        AttributeCode::Str,
        AttributeCode::Mny,
        AttributeCode::Spr,
    ];

    pub fn from_code(code: &str) -> Option<Self> {
        match code.as_bytes() {
            b"CHR" => Some(AttributeCode::Chr),
            b"INT" => Some(AttributeCode::Int),
            b"STR" => Some(AttributeCode::Str),
            b"MNY" => Some(AttributeCode::Mny),
            b"SPR" => Some(AttributeCode::Spr),
            b"LIF" => Some(AttributeCode::Lif),
            b"EVT" => Some(AttributeCode::Evt),
            b"AGE" => Some(AttributeCode::Age),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            AttributeCode::Chr => "CHR",
            AttributeCode::Int => "INT",
            AttributeCode::Str => "STR",
            AttributeCode::Mny => "MNY",
            AttributeCode::Spr => "SPR",
            AttributeCode::Lif => "LIF",
            AttributeCode::Evt => "EVT",
            AttributeCode::Age => "AGE",
        }
    }
}

/// Attribute value as seen by the condition evaluator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeValue<'a> {
    Number(i32),
    StringSet(&'a [String]),
}

/// Anything conditions can be evaluated against
pub trait AttributeSource {
    /// Look up an attribute by its code; `None` if the code is unknown here
    fn attribute(&self, code: &str) -> Option<AttributeValue<'_>>;
}

/// Attribute set for a game session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttributeSet {
    pub chr: i32,
    pub int: i32,
    #[serde(rename = "str")]
    pub str_: i32,
    pub mny: i32,
    pub spr: i32,
    pub lif: i32,
    /// Event history, in selection order
    pub evt: Vec<String>,
}

impl AttributeSet {
    pub fn new(chr: i32, int: i32, str_: i32, mny: i32, spr: i32, lif: i32) -> Self {
        Self {
            chr,
            int,
            str_,
            mny,
            spr,
            lif,
            evt: Vec::with_capacity(64),
        }
    }

    /// Numeric value of an attribute; `None` for EVT and AGE
    pub fn number(&self, code: AttributeCode) -> Option<i32> {
        match code {
            AttributeCode::Chr => Some(self.chr),
            AttributeCode::Int => Some(self.int),
            AttributeCode::Str => Some(self.str_),
            AttributeCode::Mny => Some(self.mny),
            AttributeCode::Spr => Some(self.spr),
            AttributeCode::Lif => Some(self.lif),
            AttributeCode::Evt | AttributeCode::Age => None,
        }
    }

    /// Set a numeric attribute. EVT and AGE are ignored.
    pub fn set(&mut self, code: AttributeCode, value: i32) {
        match code {
            AttributeCode::Chr => self.chr = value,
            AttributeCode::Int => self.int = value,
            AttributeCode::Str => self.str_ = value,
            AttributeCode::Mny => self.mny = value,
            AttributeCode::Spr => self.spr = value,
            AttributeCode::Lif => self.lif = value,
            AttributeCode::Evt | AttributeCode::Age => {}
        }
    }

    /// Sum of the five allocatable attributes
    pub fn allocated_total(&self) -> i32 {
        AttributeCode::ALLOCATABLE
            .iter()
            .filter_map(|code| self.number(*code))
            .sum()
    }

    /// Apply an event's deltas. Values are not clamped.
    pub fn apply_effect(&mut self, effect: &EventEffect) {
        self.chr += effect.chr;
        self.int += effect.int;
        self.str_ += effect.str_;
        self.mny += effect.mny;
        self.spr += effect.spr;
        self.lif += effect.lif;
    }

    pub fn record_event(&mut self, event_id: &str) {
        self.evt.push(event_id.to_string());
    }

    /// Fixed-order snapshot [CHR, INT, STR, MNY, SPR, LIF]
    pub fn numbers(&self) -> [i32; 6] {
        [self.chr, self.int, self.str_, self.mny, self.spr, self.lif]
    }
}

impl AttributeSource for AttributeSet {
    fn attribute(&self, code: &str) -> Option<AttributeValue<'_>> {
        match AttributeCode::from_code(code)? {
            AttributeCode::Evt => Some(AttributeValue::StringSet(&self.evt)),
            AttributeCode::Age => None,
            other => self.number(other).map(AttributeValue::Number),
        }
    }
}

/// An attribute set paired with the session's current age
#[derive(Debug, Clone, Copy)]
pub struct AgedAttributes<'a> {
    pub age: i32,
    pub attributes: &'a AttributeSet,
}

impl AttributeSource for AgedAttributes<'_> {
    fn attribute(&self, code: &str) -> Option<AttributeValue<'_>> {
        if code == "AGE" {
            return Some(AttributeValue::Number(self.age));
        }
        self.attributes.attribute(code)
    }
}
