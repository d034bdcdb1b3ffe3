//! Value-producing strategies.
//!
//! The set of generator kinds is closed: [`GeneratorBody`] names every kind the
//! engine knows, each backed by a struct in one of the submodules. A
//! [`GeneratorSpec`] wraps a body with the per-call-site nullability flag.
pub mod collection;
pub mod container;
pub mod emit;
pub mod map;
pub mod misc;
pub mod number;
pub mod string;
pub mod temporal;

use crate::error::BoxError;
use crate::hints::{Hint, Hints, InternalHint};
use crate::node::TargetClass;
use crate::random::Random;
use crate::value::Value;

pub use collection::{ArrayGenerator, CollectionGenerator};
pub use container::ContainerGenerator;
pub use emit::{EmitGenerator, EmitHelper, WhenEmpty};
pub use map::MapGenerator;
pub use misc::{BoolGenerator, ConstantGenerator, CustomGenerator, EnumGenerator, InstantiateGenerator, OneOfGenerator};
pub use number::{FloatGenerator, IntGenerator};
pub use string::{Alphabet, CharGenerator, StringGenerator};
pub use temporal::{TemporalGenerator, TemporalKind, TemporalRange};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneratorKind {
    Bool,
    Number,
    String,
    Temporal,
    Enum,
    Collection,
    Map,
    Array,
    Container,
    Emit,
    Constant,
    OneOf,
    Custom,
    Instantiate,
}

/// Behaviour shared by every generator kind.
pub trait Generator {
    fn kind(&self) -> GeneratorKind;

    fn generate(&self, random: &mut Random) -> Result<Value, BoxError>;

    /// Merge metadata for the value this generator produces.
    fn hints(&self, _random: &mut Random) -> Hints {
        Hints::new()
    }

    /// Concrete class this generator builds, when it knows it.
    fn target(&self) -> Option<TargetClass> {
        None
    }

    /// The generator cannot build the value itself and defers to a delegate.
    fn is_delegating(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
pub enum GeneratorBody {
    Bool(BoolGenerator),
    Char(CharGenerator),
    Int(IntGenerator),
    Float(FloatGenerator),
    String(StringGenerator),
    Temporal(TemporalGenerator),
    Enum(EnumGenerator),
    Collection(CollectionGenerator),
    Map(MapGenerator),
    Array(ArrayGenerator),
    Container(ContainerGenerator),
    Emit(EmitGenerator),
    Constant(ConstantGenerator),
    OneOf(OneOfGenerator),
    Custom(CustomGenerator),
    Instantiate(InstantiateGenerator),
}

#[derive(Debug, Clone)]
pub struct GeneratorSpec {
    body: GeneratorBody,
    nullable: bool,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl GeneratorSpec {
    pub fn new(body: GeneratorBody) -> Self {
        Self { body, nullable: false }
    }

    pub fn body(&self) -> &GeneratorBody {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut GeneratorBody {
        &mut self.body
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn set_nullable(&mut self, nullable: bool) {
        self.nullable = nullable;
    }

    fn inner(&self) -> &dyn Generator {
        match &self.body {
            GeneratorBody::Bool(g) => g,
            GeneratorBody::Char(g) => g,
            GeneratorBody::Int(g) => g,
            GeneratorBody::Float(g) => g,
            GeneratorBody::String(g) => g,
            GeneratorBody::Temporal(g) => g,
            GeneratorBody::Enum(g) => g,
            GeneratorBody::Collection(g) => g,
            GeneratorBody::Map(g) => g,
            GeneratorBody::Array(g) => g,
            GeneratorBody::Container(g) => g,
            GeneratorBody::Emit(g) => g,
            GeneratorBody::Constant(g) => g,
            GeneratorBody::OneOf(g) => g,
            GeneratorBody::Custom(g) => g,
            GeneratorBody::Instantiate(g) => g,
        }
    }

    pub fn kind(&self) -> GeneratorKind {
        self.inner().kind()
    }

    pub fn generate(&self, random: &mut Random) -> Result<Value, BoxError> {
        self.inner().generate(random)
    }

    pub fn is_delegating(&self) -> bool {
        self.inner().is_delegating()
    }

    pub fn as_emit(&self) -> Option<&EmitGenerator> {
        match &self.body {
            GeneratorBody::Emit(e) => Some(e),
            _ => None,
        }
    }

    /// The generator's hints, with the internal hint carrying nullability and
    /// the target class. Custom generators only get an internal hint when they
    /// are nullable or supplied one themselves.
    pub fn hints(&self, random: &mut Random) -> Hints {
        let hints = self.inner().hints(random);
        let custom = matches!(self.body, GeneratorBody::Custom(_));
        let mut internal = match hints.internal() {
            Some(existing) => existing.clone(),
            None if custom && !self.nullable => return hints,
            None => InternalHint::default(),
        };
        if internal.target.is_none() {
            internal.target = self.inner().target();
        }
        internal.delegating |= self.is_delegating();
        internal.nullable_result = self.nullable;
        hints.with(Hint::Internal(internal))
    }

    /// Push a concrete array class down into the generator, overriding the
    /// subtype it would otherwise choose.
    pub fn push_subtype(&mut self, target: &TargetClass) {
        if let (GeneratorBody::Array(array), TargetClass::Array { .. }) = (&mut self.body, target) {
            array.subtype = Some(target.clone());
        }
    }
}

macro_rules! spec_from {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for GeneratorSpec {
                fn from(g: $ty) -> Self {
                    GeneratorSpec::new(GeneratorBody::$variant(g))
                }
            }
        )*
    };
}

spec_from! {
    Bool => BoolGenerator,
    Char => CharGenerator,
    Int => IntGenerator,
    Float => FloatGenerator,
    String => StringGenerator,
    Temporal => TemporalGenerator,
    Enum => EnumGenerator,
    Collection => CollectionGenerator,
    Map => MapGenerator,
    Array => ArrayGenerator,
    Container => ContainerGenerator,
    Emit => EmitGenerator,
    Constant => ConstantGenerator,
    OneOf => OneOfGenerator,
    Custom => CustomGenerator,
    Instantiate => InstantiateGenerator,
}
