use crate::semantic::ComparableType;

/// First line of every generated file. Go tooling recognises the
/// `Code generated ... DO NOT EDIT.` form.
pub const HEADER: &str = "// Code generated by ingen. DO NOT EDIT.";

// ============================================================================
// Emitter
// ============================================================================

/// Renders membership methods for a list of comparable types.
///
/// Pure text generation: no I/O, no imports, no formatting beyond the
/// tab-indented layout `gofmt` would produce.
pub struct Emitter {
    package: String,
    method: String,
}

impl Emitter {
    pub fn new(package: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            method: method.into(),
        }
    }

    /// Generate the whole file: header, package clause, one method per type
    /// in the given order.
    pub fn emit(&self, types: &[ComparableType]) -> String {
        let mut out = String::new();
        out.push_str(HEADER);
        out.push_str("\n\npackage ");
        out.push_str(&self.package);
        out.push('\n');
        for ty in types {
            out.push('\n');
            self.emit_method(&mut out, ty);
        }
        out
    }

    fn emit_method(&self, out: &mut String, ty: &ComparableType) {
        let receiver = receiver_type(ty);
        // Parameter names share a scope with the type parameters.
        let mut taken = ty.type_params.clone();
        let v = fresh_name("v", &mut taken);
        let list = fresh_name("list", &mut taken);
        let l = fresh_name("l", &mut taken);
        out.push_str(&format!(
            "func ({v} {receiver}) {method}({list} ...{receiver}) bool {{\n",
            method = self.method
        ));
        out.push_str(&format!("\tfor _, {l} := range {list} {{\n"));
        out.push_str(&format!("\t\tif {v} == {l} {{\n"));
        out.push_str("\t\t\treturn true\n");
        out.push_str("\t\t}\n");
        out.push_str("\t}\n");
        out.push_str("\treturn false\n");
        out.push_str("}\n");
    }
}

/// `base`, or `base` with the smallest numeric suffix not in `taken`.
/// The chosen name is added to `taken`.
fn fresh_name(base: &str, taken: &mut Vec<String>) -> String {
    let mut name = base.to_string();
    let mut n = 1;
    while taken.contains(&name) {
        name = format!("{base}{n}");
        n += 1;
    }
    taken.push(name.clone());
    name
}

/// `T`, or `T[K, V]` for generic types.
fn receiver_type(ty: &ComparableType) -> String {
    if ty.type_params.is_empty() {
        ty.name.clone()
    } else {
        format!("{}[{}]", ty.name, ty.type_params.join(", "))
    }
}

/// Render with the default method name.
pub fn emit(types: &[ComparableType], package: &str) -> String {
    Emitter::new(package, ingen_common::config::DEFAULT_METHOD).emit(types)
}
