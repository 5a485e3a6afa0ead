#[cfg(test)]
pub mod test {
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use crate::error::RunfigError;
    use crate::file::{MappingLoader, is_supported_extension};
    use crate::schema::{Field, Schema};
    use crate::typing::{DeclaredType, EnumBinding, PrimitiveKind};
    use crate::value::Mapping;

    /// Serializes tests that change the process working directory.
    pub static CWD_LOCK: Mutex<()> = Mutex::new(());

    /// `a` required int, `b = 2`, `c = false`, `d = true`, `e = "test"`.
    pub fn simple_schema() -> Schema {
        Schema::builder("A")
            .field(Field::int("a").required())
            .field(Field::int("b").with_default(2))
            .field(Field::bool("c", false))
            .field(Field::bool("d", true))
            .field(Field::string("e").with_default("test"))
            .build()
            .unwrap()
    }

    /// `B { a: float, b: A { c: int = 1 } }`.
    pub fn nested_schema() -> Schema {
        let a = Schema::builder("A")
            .field(Field::int("c").with_default(1))
            .build()
            .unwrap();
        Schema::builder("B")
            .field(Field::float("a"))
            .field(Field::nested("b", a))
            .build()
            .unwrap()
    }

    /// Required fields at both levels.
    pub fn required_schema() -> Schema {
        let inner = Schema::builder("Inner")
            .field(Field::int("x").required())
            .field(Field::string("y").with_default("y"))
            .build()
            .unwrap();
        Schema::builder("R")
            .field(Field::int("a").required())
            .field(Field::nested("inner", inner))
            .build()
            .unwrap()
    }

    /// `lr` in `[-1, 2]` defaulting to 1, `xs` exactly three ints.
    pub fn bounded_schema() -> Schema {
        Schema::builder("Bounded")
            .field(
                Field::float("lr")
                    .bounded(Some(-1.0), Some(2.0))
                    .with_default(1.0),
            )
            .field(Field::list("xs", PrimitiveKind::Int).sequence([1, 2, 3], Some(3)))
            .build()
            .unwrap()
    }

    /// An enumeration plus an optional float with no default.
    pub fn enum_schema() -> Schema {
        Schema::builder("E")
            .field(
                Field::enumeration("act", EnumBinding::new("Act", ["relu", "gelu"]))
                    .with_default("relu"),
            )
            .field(Field::new(
                "dropout",
                DeclaredType::optional(DeclaredType::Float),
            ))
            .build()
            .unwrap()
    }

    /// In-memory [`MappingLoader`] keyed by path.
    #[derive(Default)]
    pub struct MemoryLoader {
        files: HashMap<PathBuf, Mapping>,
    }

    impl MemoryLoader {
        pub fn with(mut self, path: &str, content: serde_json::Value) -> Self {
            let serde_json::Value::Object(mapping) = content else {
                panic!("fixture file {path} must hold a mapping");
            };
            self.files.insert(PathBuf::from(path), mapping);
            self
        }
    }

    impl MappingLoader for MemoryLoader {
        fn load(&self, path: &Path) -> Result<Mapping, RunfigError> {
            if !is_supported_extension(path) {
                return Err(RunfigError::UnsupportedFileType {
                    path: path.to_path_buf(),
                });
            }
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| RunfigError::FileNotFound(path.to_path_buf()))
        }
    }

    #[test]
    fn fixtures_build() {
        assert_eq!(simple_schema().fields().len(), 5);
        assert!(nested_schema().nested("b").is_some());
        assert!(required_schema().field("a").unwrap().is_required());
    }
}
