//! Typed documents: marshallable traits and a name-to-decoder registry.
//!
//! A typed value goes on the wire as a type-name marker followed by a
//! length-prefixed block holding the value's fields. The reader side
//! resolves the name through a [`TypeRegistry`], so a stream can carry
//! values whose concrete type is only known at runtime.

use std::any::Any;

use rustc_hash::FxHashMap;

use crate::codec::value::{BinaryReader, BinaryWriter};
use crate::error::{DecodeError, EncodeError};

/// A value that can write its fields to a wire stream.
pub trait WriteMarshallable {
    fn write_marshallable(&self, w: &mut BinaryWriter) -> Result<(), EncodeError>;
}

/// A value that can be rebuilt from its wire fields.
pub trait ReadMarshallable: Sized {
    fn read_marshallable(r: &mut BinaryReader<'_>) -> Result<Self, DecodeError>;
}

impl BinaryWriter {
    /// Writes a value's fields as a length-prefixed block.
    pub fn write_marshallable<T>(&mut self, value: &T) -> Result<(), EncodeError>
    where
        T: WriteMarshallable + ?Sized,
    {
        self.write_block(|w| value.write_marshallable(w))
    }

    /// Writes a type-name marker followed by the value's block.
    pub fn write_typed<T>(&mut self, name: &str, value: &T) -> Result<(), EncodeError>
    where
        T: WriteMarshallable + ?Sized,
    {
        self.write_type(name);
        self.write_marshallable(value)
    }
}

impl BinaryReader<'_> {
    /// Reads a length-prefixed block as a value of a statically known type.
    pub fn read_marshallable<T: ReadMarshallable>(&mut self) -> Result<T, DecodeError> {
        self.read_block(|b| T::read_marshallable(b))
    }
}

type Factory =
    Box<dyn Fn(&mut BinaryReader<'_>) -> Result<Box<dyn Any>, DecodeError> + Send + Sync>;

/// Maps wire type names to decoders.
///
/// Names are exact strings; [`alias`](Self::alias) lets a stream written
/// under an old or abbreviated name decode as the canonical type.
#[derive(Default)]
pub struct TypeRegistry {
    factories: FxHashMap<String, Factory>,
    aliases: FxHashMap<String, String>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a decoder under a wire type name.
    pub fn register<T>(&mut self, name: impl Into<String>)
    where
        T: ReadMarshallable + 'static,
    {
        self.factories.insert(
            name.into(),
            Box::new(|r| Ok(Box::new(T::read_marshallable(r)?) as Box<dyn Any>)),
        );
    }

    /// Adds an alternative wire name for an already registered type.
    pub fn alias(&mut self, alias: impl Into<String>, canonical: impl Into<String>) {
        self.aliases.insert(alias.into(), canonical.into());
    }

    fn factory(&self, name: &str) -> Result<&Factory, DecodeError> {
        let canonical = self.aliases.get(name).map(String::as_str).unwrap_or(name);
        self.factories
            .get(canonical)
            .ok_or_else(|| DecodeError::UnknownType {
                name: name.to_string(),
            })
    }

    /// Reads a typed value, dispatching on the wire type name.
    ///
    /// An unregistered name is fatal; the decoder never guesses at an
    /// unknown type's layout.
    pub fn read_typed_any(
        &self,
        r: &mut BinaryReader<'_>,
    ) -> Result<Box<dyn Any>, DecodeError> {
        let name = r.read_type_name()?;
        let factory = self.factory(name)?;
        r.read_block(|b| factory(b))
    }

    /// Reads a typed value expected to be a `T`.
    pub fn read_typed<T: Any>(&self, r: &mut BinaryReader<'_>) -> Result<T, DecodeError> {
        let name = r.read_type_name()?;
        let factory = self.factory(name)?;
        let boxed = r.read_block(|b| factory(b))?;
        boxed
            .downcast::<T>()
            .map(|b| *b)
            .map_err(|_| DecodeError::UnknownType {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::field::Key;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Point {
        x: i64,
        y: i64,
    }

    const X: Key<'static> = Key::new("x", 1);
    const Y: Key<'static> = Key::new("y", 2);

    impl WriteMarshallable for Point {
        fn write_marshallable(&self, w: &mut BinaryWriter) -> Result<(), EncodeError> {
            w.write_key(&X);
            w.write_i64(self.x);
            w.write_key(&Y);
            w.write_i64(self.y);
            Ok(())
        }
    }

    impl ReadMarshallable for Point {
        fn read_marshallable(r: &mut BinaryReader<'_>) -> Result<Self, DecodeError> {
            r.read_key(&X)?;
            let x = r.read_i64()?;
            r.read_key(&Y)?;
            let y = r.read_i64()?;
            Ok(Self { x, y })
        }
    }

    #[test]
    fn test_marshallable_roundtrip() {
        let p = Point { x: 3, y: -4 };
        let mut w = BinaryWriter::new();
        w.write_marshallable(&p).unwrap();

        let got: Point = BinaryReader::new(w.as_bytes()).read_marshallable().unwrap();
        assert_eq!(got, p);
    }

    #[test]
    fn test_typed_roundtrip() {
        let p = Point { x: 1, y: 2 };
        let mut w = BinaryWriter::new();
        w.write_typed("point", &p).unwrap();

        let mut registry = TypeRegistry::new();
        registry.register::<Point>("point");

        let got: Point = registry
            .read_typed(&mut BinaryReader::new(w.as_bytes()))
            .unwrap();
        assert_eq!(got, p);
    }

    #[test]
    fn test_alias_resolves() {
        let p = Point { x: 5, y: 6 };
        let mut w = BinaryWriter::new();
        w.write_typed("pt", &p).unwrap();

        let mut registry = TypeRegistry::new();
        registry.register::<Point>("point");
        registry.alias("pt", "point");

        let got: Point = registry
            .read_typed(&mut BinaryReader::new(w.as_bytes()))
            .unwrap();
        assert_eq!(got, p);
    }

    #[test]
    fn test_unknown_type_is_fatal() {
        let p = Point { x: 0, y: 0 };
        let mut w = BinaryWriter::new();
        w.write_typed("mystery", &p).unwrap();

        let registry = TypeRegistry::new();
        let err = registry
            .read_typed::<Point>(&mut BinaryReader::new(w.as_bytes()))
            .unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnknownType {
                name: "mystery".to_string()
            }
        );
    }

    #[test]
    fn test_read_typed_any_dispatch() {
        let p = Point { x: 9, y: 9 };
        let mut w = BinaryWriter::new();
        w.write_typed("point", &p).unwrap();

        let mut registry = TypeRegistry::new();
        registry.register::<Point>("point");

        let any = registry
            .read_typed_any(&mut BinaryReader::new(w.as_bytes()))
            .unwrap();
        assert_eq!(any.downcast_ref::<Point>(), Some(&p));
    }

    #[test]
    fn test_nested_marshallable() {
        #[derive(Debug, PartialEq)]
        struct Segment {
            from: Point,
            to: Point,
        }

        impl WriteMarshallable for Segment {
            fn write_marshallable(&self, w: &mut BinaryWriter) -> Result<(), EncodeError> {
                w.write_key(&Key::new("from", 1));
                w.write_marshallable(&self.from)?;
                w.write_key(&Key::new("to", 2));
                w.write_marshallable(&self.to)
            }
        }

        impl ReadMarshallable for Segment {
            fn read_marshallable(r: &mut BinaryReader<'_>) -> Result<Self, DecodeError> {
                r.read_key(&Key::new("from", 1))?;
                let from = r.read_marshallable()?;
                r.read_key(&Key::new("to", 2))?;
                let to = r.read_marshallable()?;
                Ok(Self { from, to })
            }
        }

        let seg = Segment {
            from: Point { x: 0, y: 0 },
            to: Point { x: 10, y: 20 },
        };
        let mut w = BinaryWriter::new();
        w.write_marshallable(&seg).unwrap();

        let got: Segment = BinaryReader::new(w.as_bytes()).read_marshallable().unwrap();
        assert_eq!(got, seg);
    }
}
