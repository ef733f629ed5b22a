//! Dart output backend.
//!
//! Emits one Dart library per schema: enums with total wire codecs,
//! abstract capability interfaces, concrete records with
//! `fromMap`/`toMap` wire codecs, result-union and union hierarchies as
//! sealed classes, operation capabilities, and handler typedefs.
//!
//! Generation is deterministic: the same schema always produces
//! byte-identical text (output is committed and diffed downstream).

use crate::emit::CodeWriter;
use crate::ir::{
    FlattenedMember, IrEnum, IrInput, IrInterface, IrObject, IrOperation, IrOperationField,
    IrSchema, IrType, IrTypeKind, IrUnion, ResultUnionEntry, flatten_union,
};
use crate::naming::{
    self, FLATTENED_ARG_NAMES, PURCHASE_KIND_TAGS, PURCHASE_SHARED_FLAG, PURCHASE_STOREFRONTS,
};
use crate::traits::Backend;

/// Dart reserved words. Names colliding with these are escaped with a
/// trailing underscore.
pub const DART_KEYWORDS: &[&str] = &[
    "assert", "break", "case", "catch", "class", "const", "continue", "default", "do", "else",
    "enum", "extends", "false", "final", "finally", "for", "if", "in", "is", "new", "null",
    "rethrow", "return", "super", "switch", "this", "throw", "true", "try", "var", "void", "while",
    "with",
];

/// Options for Dart generation.
#[derive(Debug, Clone)]
pub struct DartOptions {
    /// Emit the do-not-edit header. On by default.
    pub header: bool,
    /// Emit a `library` directive with this name.
    pub library: Option<String>,
}

impl Default for DartOptions {
    fn default() -> Self {
        Self {
            header: true,
            library: None,
        }
    }
}

/// Backend registration for Dart.
pub struct DartBackend;

pub static DART_BACKEND: DartBackend = DartBackend;

impl Backend for DartBackend {
    fn name(&self) -> &'static str {
        "dart"
    }

    fn language(&self) -> &'static str {
        "dart"
    }

    fn extension(&self) -> &'static str {
        "dart"
    }

    fn keywords(&self) -> &'static [&'static str] {
        DART_KEYWORDS
    }

    fn scalar_type(&self, scalar: &str) -> Option<&'static str> {
        dart_scalar(scalar)
    }

    fn type_name(&self, ty: &IrType, _schema: &IrSchema) -> String {
        dart_type(ty)
    }

    fn generate(&self, schema: &IrSchema) -> String {
        generate_dart(schema, &DartOptions::default())
    }
}

fn dart_scalar(scalar: &str) -> Option<&'static str> {
    match scalar {
        "String" => Some("String"),
        "ID" => Some("String"),
        "Int" => Some("int"),
        "Float" => Some("double"),
        "Boolean" => Some("bool"),
        "Json" => Some("Map<String, dynamic>"),
        _ => None,
    }
}

/// Render a type occurrence in Dart syntax. Unmapped scalars fall back
/// to `dynamic` (which already admits null) and are logged for
/// follow-up rather than aborting generation.
fn dart_type(ty: &IrType) -> String {
    let base = match &ty.kind {
        IrTypeKind::Scalar(scalar) => match dart_scalar(scalar) {
            Some(mapped) => mapped.to_string(),
            None => {
                tracing::warn!(scalar, backend = "dart", "no scalar mapping, using dynamic");
                return "dynamic".to_string();
            }
        },
        IrTypeKind::List(element) => format!("List<{}>", dart_type(element)),
        IrTypeKind::Enum(name)
        | IrTypeKind::Object(name)
        | IrTypeKind::Input(name)
        | IrTypeKind::Interface(name)
        | IrTypeKind::Union(name) => name.clone(),
    };
    if ty.nullable {
        format!("{base}?")
    } else {
        base
    }
}

/// The expression decoding `expr` (a wire-map value) into the Dart type
/// for `ty`.
fn decode_expr(ty: &IrType, expr: &str) -> String {
    match &ty.kind {
        IrTypeKind::Scalar(scalar) => match dart_scalar(scalar) {
            // JSON numbers may arrive as int; route through num.
            Some("double") => {
                if ty.nullable {
                    format!("({expr} as num?)?.toDouble()")
                } else {
                    format!("({expr} as num).toDouble()")
                }
            }
            Some(mapped) => {
                if ty.nullable {
                    format!("{expr} as {mapped}?")
                } else {
                    format!("{expr} as {mapped}")
                }
            }
            None => expr.to_string(),
        },
        IrTypeKind::Enum(name) => {
            if ty.nullable {
                format!("{expr} == null ? null : {name}.decode({expr} as String)")
            } else {
                format!("{name}.decode({expr} as String)")
            }
        }
        IrTypeKind::Object(name) | IrTypeKind::Union(name) => {
            if ty.nullable {
                format!("{expr} == null ? null : {name}.fromMap({expr} as Map<String, dynamic>)")
            } else {
                format!("{name}.fromMap({expr} as Map<String, dynamic>)")
            }
        }
        // Inputs are write-only and interfaces are not instantiable; the
        // IR builder does not put them on the decode path.
        IrTypeKind::Input(_) | IrTypeKind::Interface(_) => expr.to_string(),
        IrTypeKind::List(element) => {
            let inner = decode_expr(element, "e");
            if ty.nullable {
                format!("({expr} as List<dynamic>?)?.map((e) => {inner}).toList()")
            } else {
                format!("({expr} as List<dynamic>).map((e) => {inner}).toList()")
            }
        }
    }
}

/// The expression encoding a non-null `expr` into its wire-map value.
fn encode_expr(ty: &IrType, expr: &str) -> String {
    match &ty.kind {
        IrTypeKind::Scalar(_) => expr.to_string(),
        IrTypeKind::Enum(_) => format!("{expr}.encode()"),
        IrTypeKind::Object(_)
        | IrTypeKind::Union(_)
        | IrTypeKind::Input(_)
        | IrTypeKind::Interface(_) => {
            format!("{expr}.toMap()")
        }
        IrTypeKind::List(element) => {
            if matches!(element.kind, IrTypeKind::Scalar(_)) {
                return expr.to_string();
            }
            let inner = encode_expr(element, "e");
            if element.nullable {
                format!("{expr}.map((e) => e == null ? null : {inner}).toList()")
            } else {
                format!("{expr}.map((e) => {inner}).toList()")
            }
        }
    }
}

fn escape(name: &str) -> String {
    naming::escape_keyword(name, DART_KEYWORDS).into_owned()
}

/// A field as the Dart backend emits it: escaped member name, original
/// wire key, and an optional literal default from the override table.
struct EmitField {
    member: String,
    wire: String,
    ty: IrType,
    default: Option<String>,
    description: Option<String>,
}

impl EmitField {
    fn optional(&self) -> bool {
        self.ty.nullable && self.default.is_none()
    }
}

/// Generate Dart source for the whole schema.
pub fn generate_dart(schema: &IrSchema, options: &DartOptions) -> String {
    let mut g = DartGenerator {
        schema,
        w: CodeWriter::new("  "),
    };
    g.header(options);
    for e in &schema.enums {
        g.enum_decl(e);
    }
    for i in &schema.interfaces {
        g.interface_decl(i);
    }
    for o in &schema.objects {
        g.object_decl(o);
    }
    for i in &schema.inputs {
        if naming::is_purchase_params(&i.name) {
            g.purchase_params_decl(i);
        } else {
            g.input_decl(i);
        }
    }
    for u in &schema.unions {
        g.union_decl(u);
    }
    for op in &schema.operations {
        g.operation_decl(op);
    }
    for op in &schema.operations {
        g.handler_decls(op);
    }
    let mut out = g.w.finish();
    // Exactly one trailing newline.
    while out.ends_with("\n\n") {
        out.pop();
    }
    out
}

struct DartGenerator<'a> {
    schema: &'a IrSchema,
    w: CodeWriter,
}

impl DartGenerator<'_> {
    fn header(&mut self, options: &DartOptions) {
        if options.header {
            self.w.line("// GENERATED CODE - DO NOT MODIFY BY HAND.");
            self.w
                .line("// Wire-compatible contract bindings; regenerate from the schema.");
            self.w.blank();
        }
        if let Some(library) = &options.library {
            self.w.line(format!("library {library};"));
            self.w.blank();
        }
    }

    fn enum_decl(&mut self, e: &IrEnum) {
        self.w.doc(e.description.as_deref(), "/// ");
        self.w.line(format!("enum {} {{", e.name));
        self.w.indent();
        let last = e.values.len().saturating_sub(1);
        for (index, value) in e.values.iter().enumerate() {
            self.w.doc(value.description.as_deref(), "/// ");
            let tag = escape(&naming::enum_value_case(&value.name));
            let separator = if index == last { ";" } else { "," };
            self.w
                .line(format!("{tag}('{}'){separator}", value.raw_value));
        }
        self.w.blank();
        self.w.line(format!("const {}(this.rawValue);", e.name));
        self.w.blank();
        self.w.line("final String rawValue;");
        self.w.blank();
        self.w
            .line("/// Decode a wire value. Throws [FormatException] for an");
        self.w
            .line("/// unrecognized value instead of silently defaulting.");
        self.w
            .line(format!("static {} decode(String raw) {{", e.name));
        self.w.indent();
        self.w.line("for (final value in values) {");
        self.w.indent();
        self.w.line("if (value.rawValue == raw) {");
        self.w.indent();
        self.w.line("return value;");
        self.w.dedent();
        self.w.line("}");
        self.w.dedent();
        self.w.line("}");
        self.w.line(format!(
            "throw FormatException('Unknown {} value: $raw');",
            e.name
        ));
        self.w.dedent();
        self.w.line("}");
        self.w.blank();
        self.w.line("String encode() => rawValue;");
        self.w.dedent();
        self.w.line("}");
        self.w.blank();
    }

    fn interface_decl(&mut self, i: &IrInterface) {
        self.w.doc(i.description.as_deref(), "/// ");
        self.w.line(format!("abstract class {} {{", i.name));
        self.w.indent();
        for field in sorted_fields(&i.fields) {
            self.w.doc(field.description.as_deref(), "/// ");
            self.w.line(format!(
                "{} get {};",
                dart_type(&field.ty),
                escape(&field.name)
            ));
        }
        if !i.fields.is_empty() {
            self.w.blank();
        }
        // Interface-typed fields serialize through this hook.
        self.w.line("Map<String, dynamic> toMap();");
        self.w.dedent();
        self.w.line("}");
        self.w.blank();
    }

    fn object_fields(&self, o: &IrObject) -> Vec<EmitField> {
        let mut fields: Vec<EmitField> = o
            .fields
            .iter()
            .map(|f| {
                let default = naming::field_default(&o.name, &f.name).map(|(enum_name, tag)| {
                    format!("{enum_name}.{}", naming::enum_value_case(tag))
                });
                EmitField {
                    member: escape(&f.name),
                    wire: f.name.clone(),
                    ty: f.ty.clone(),
                    default,
                    description: f.description.clone(),
                }
            })
            .collect();
        if let Some(shim) = naming::legacy_bool_shim(&o.name) {
            fields.push(EmitField {
                member: escape(shim),
                wire: shim.to_string(),
                ty: IrType::scalar("Boolean").nullable(),
                default: None,
                description: Some("Kept for backward wire compatibility.".to_string()),
            });
        }
        fields.sort_by(|a, b| a.wire.cmp(&b.wire));
        fields
    }

    fn constructor(&mut self, type_name: &str, fields: &[EmitField]) {
        if fields.is_empty() {
            self.w.line(format!("const {type_name}();"));
            return;
        }
        self.w.line(format!("const {type_name}({{"));
        self.w.indent();
        for field in fields {
            if let Some(default) = &field.default {
                self.w.line(format!("this.{} = {default},", field.member));
            } else if field.ty.nullable {
                self.w.line(format!("this.{},", field.member));
            } else {
                self.w.line(format!("required this.{},", field.member));
            }
        }
        self.w.dedent();
        self.w.line("});");
    }

    fn field_decls(&mut self, fields: &[EmitField]) {
        for field in fields {
            self.w.doc(field.description.as_deref(), "/// ");
            let ty = if field.default.is_some() {
                dart_type(&IrType {
                    nullable: false,
                    ..field.ty.clone()
                })
            } else {
                dart_type(&field.ty)
            };
            self.w.line(format!("final {ty} {};", field.member));
        }
    }

    fn from_map(&mut self, type_name: &str, fields: &[EmitField]) {
        self.w.line(format!(
            "factory {type_name}.fromMap(Map<String, dynamic> map) {{"
        ));
        self.w.indent();
        if fields.is_empty() {
            self.w.line(format!("return const {type_name}();"));
        } else {
            self.w.line(format!("return {type_name}("));
            self.w.indent();
            for field in fields {
                let source = format!("map['{}']", field.wire);
                let expr = match &field.default {
                    Some(default) => format!(
                        "{source} == null ? {default} : {}",
                        decode_expr(&field.ty, &source)
                    ),
                    None => decode_expr(&field.ty, &source),
                };
                self.w.line(format!("{}: {expr},", field.member));
            }
            self.w.dedent();
            self.w.line(");");
        }
        self.w.dedent();
        self.w.line("}");
    }

    fn to_map(&mut self, fields: &[EmitField], type_tag: Option<&str>, with_override: bool) {
        if with_override {
            self.w.line("@override");
        }
        self.w.line("Map<String, dynamic> toMap() {");
        self.w.indent();
        self.w.line("return <String, dynamic>{");
        self.w.indent();
        if let Some(tag) = type_tag {
            self.w.line(format!("'__typename': '{tag}',"));
        }
        for field in fields {
            if field.optional() {
                let value = if matches!(field.ty.kind, IrTypeKind::Scalar(_)) {
                    field.member.clone()
                } else {
                    encode_expr(&field.ty, &format!("{}!", field.member))
                };
                self.w.line(format!(
                    "if ({} != null) '{}': {value},",
                    field.member, field.wire
                ));
            } else {
                self.w.line(format!(
                    "'{}': {},",
                    field.wire,
                    encode_expr(&field.ty, &field.member)
                ));
            }
        }
        self.w.dedent();
        self.w.line("};");
        self.w.dedent();
        self.w.line("}");
    }

    fn object_decl(&mut self, o: &IrObject) {
        if let Some(entries) = &o.result_union {
            self.result_union_decl(o, entries);
            return;
        }
        self.w.doc(o.description.as_deref(), "/// ");
        let mut clause = String::new();
        let base_union = o.unions.first();
        if let Some(base) = base_union {
            clause.push_str(&format!(" extends {base}"));
        }
        if !o.interfaces.is_empty() {
            clause.push_str(&format!(" implements {}", o.interfaces.join(", ")));
        }
        self.w.line(format!("class {}{clause} {{", o.name));
        self.w.indent();
        let fields = self.object_fields(o);
        self.constructor(&o.name, &fields);
        self.w.blank();
        self.from_map(&o.name, &fields);
        if !fields.is_empty() {
            self.w.blank();
            self.field_decls(&fields);
        }
        self.w.blank();
        let overrides = base_union.is_some() || !o.interfaces.is_empty();
        self.to_map(&fields, Some(&o.name), overrides);
        self.w.dedent();
        self.w.line("}");
        self.w.blank();
    }

    /// A result-union declaration stands for "exactly one of N named
    /// outcomes": an empty marker supertype plus one wrapper subtype
    /// per outcome, sorted by name.
    fn result_union_decl(&mut self, o: &IrObject, entries: &[ResultUnionEntry]) {
        let mut entries: Vec<&ResultUnionEntry> = entries.iter().collect();
        entries.sort_by(|a, b| a.field_name.cmp(&b.field_name));

        self.w.doc(o.description.as_deref(), "/// ");
        self.w.line(format!("sealed class {} {{", o.name));
        self.w.indent();
        self.w.line(format!("const {}();", o.name));
        self.w.blank();
        self.w.line(format!(
            "static {} fromMap(Map<String, dynamic> map) {{",
            o.name
        ));
        self.w.indent();
        for entry in &entries {
            self.w
                .line(format!("if (map.containsKey('{}')) {{", entry.field_name));
            self.w.indent();
            let wrapper = wrapper_name(&o.name, &entry.field_name);
            let value = decode_expr(&entry.ty, &format!("map['{}']", entry.field_name));
            self.w.line(format!("return {wrapper}({value});"));
            self.w.dedent();
            self.w.line("}");
        }
        self.w.line(format!(
            "throw FormatException('Unrecognized {} payload');",
            o.name
        ));
        self.w.dedent();
        self.w.line("}");
        self.w.blank();
        self.w.line("Map<String, dynamic> toMap();");
        self.w.dedent();
        self.w.line("}");
        self.w.blank();

        for entry in &entries {
            let wrapper = wrapper_name(&o.name, &entry.field_name);
            let member = escape(&entry.field_name);
            self.w.line(format!(
                "/// The `{}` outcome of [{}].",
                entry.field_name, o.name
            ));
            self.w
                .line(format!("class {wrapper} extends {} {{", o.name));
            self.w.indent();
            self.w.line(format!("const {wrapper}(this.{member});"));
            self.w.blank();
            self.w
                .line(format!("final {} {member};", dart_type(&entry.ty)));
            self.w.blank();
            self.w.line("@override");
            self.w.line("Map<String, dynamic> toMap() {");
            self.w.indent();
            self.w.line(format!(
                "return <String, dynamic>{{'{}': {}}};",
                entry.field_name,
                encode_expr(&entry.ty, &member)
            ));
            self.w.dedent();
            self.w.line("}");
            self.w.dedent();
            self.w.line("}");
            self.w.blank();
        }
    }

    fn input_decl(&mut self, i: &IrInput) {
        self.w.doc(i.description.as_deref(), "/// ");
        self.w.line(format!("class {} {{", i.name));
        self.w.indent();
        let mut fields: Vec<EmitField> = i
            .fields
            .iter()
            .map(|f| EmitField {
                member: escape(&f.name),
                wire: f.name.clone(),
                ty: f.ty.clone(),
                default: None,
                description: f.description.clone(),
            })
            .collect();
        fields.sort_by(|a, b| a.wire.cmp(&b.wire));
        self.constructor(&i.name, &fields);
        if !fields.is_empty() {
            self.w.blank();
            self.field_decls(&fields);
        }
        self.w.blank();
        // Inputs are write-only: no type tag, no decode constructor.
        self.to_map(&fields, None, false);
        self.w.dedent();
        self.w.line("}");
        self.w.blank();
    }

    /// Hand-emitted two-variant purchase params: one variant per
    /// purchase kind, each taking labelled per-storefront payloads plus
    /// the shared flag, serialized as nested per-storefront maps plus a
    /// `type` discriminant.
    fn purchase_params_decl(&mut self, i: &IrInput) {
        let name = &i.name;
        self.w.doc(i.description.as_deref(), "/// ");
        self.w.line(format!("sealed class {name} {{"));
        self.w.indent();
        self.w.line(format!("const {name}();"));
        for (kind, _tag) in PURCHASE_KIND_TAGS {
            self.w.blank();
            let variant = wrapper_name(name, kind);
            self.w
                .line(format!("const factory {name}.{kind}({{"));
            self.w.indent();
            for (label, in_app, subscription) in PURCHASE_STOREFRONTS {
                let payload = if *kind == "inApp" { in_app } else { subscription };
                self.w.line(format!("{payload}? {label},"));
            }
            self.w.line(format!("bool? {PURCHASE_SHARED_FLAG},"));
            self.w.dedent();
            self.w.line(format!("}}) = {variant};"));
        }
        self.w.blank();
        self.w.line("Map<String, dynamic> toMap();");
        self.w.dedent();
        self.w.line("}");
        self.w.blank();

        for (kind, tag) in PURCHASE_KIND_TAGS {
            let variant = wrapper_name(name, kind);
            self.w.line(format!("class {variant} extends {name} {{"));
            self.w.indent();
            self.w.line(format!("const {variant}({{"));
            self.w.indent();
            for (label, _, _) in PURCHASE_STOREFRONTS {
                self.w.line(format!("this.{label},"));
            }
            self.w.line(format!("this.{PURCHASE_SHARED_FLAG},"));
            self.w.dedent();
            self.w.line("});");
            self.w.blank();
            for (label, in_app, subscription) in PURCHASE_STOREFRONTS {
                let payload = if *kind == "inApp" { in_app } else { subscription };
                self.w.line(format!("final {payload}? {label};"));
            }
            self.w
                .line(format!("final bool? {PURCHASE_SHARED_FLAG};"));
            self.w.blank();
            self.w.line("@override");
            self.w.line("Map<String, dynamic> toMap() {");
            self.w.indent();
            self.w.line("return <String, dynamic>{");
            self.w.indent();
            self.w.line(format!("'type': '{tag}',"));
            for (label, _, _) in PURCHASE_STOREFRONTS {
                self.w.line(format!(
                    "if ({label} != null) '{label}': {label}!.toMap(),"
                ));
            }
            self.w.line(format!(
                "if ({PURCHASE_SHARED_FLAG} != null) '{PURCHASE_SHARED_FLAG}': {PURCHASE_SHARED_FLAG},"
            ));
            self.w.dedent();
            self.w.line("};");
            self.w.dedent();
            self.w.line("}");
            self.w.dedent();
            self.w.line("}");
            self.w.blank();
        }
    }

    fn union_decl(&mut self, u: &IrUnion) {
        // A flattening error means the schema skipped validation; abort
        // this run rather than emit a dispatcher with missing cases.
        let members = flatten_union(self.schema, u)
            .unwrap_or_else(|err| panic!("invalid schema for union `{}`: {err}", u.name));

        self.w.doc(u.description.as_deref(), "/// ");
        let clause = if u.shared_interfaces.is_empty() {
            String::new()
        } else {
            format!(" implements {}", u.shared_interfaces.join(", "))
        };
        self.w.line(format!("sealed class {}{clause} {{", u.name));
        self.w.indent();
        self.w.line(format!("const {}();", u.name));
        self.w.blank();
        self.w.line(format!(
            "static {} fromMap(Map<String, dynamic> map) {{",
            u.name
        ));
        self.w.indent();
        self.w
            .line("final typename = map['__typename'] as String?;");
        self.w.line("switch (typename) {");
        self.w.indent();
        for member in &members {
            self.w.line(format!("case '{}':", member.object));
            self.w.indent();
            self.w.line(format!("return {};", self.dispatch_expr(u, member)));
            self.w.dedent();
        }
        self.w.line("default:");
        self.w.indent();
        self.w.line(format!(
            "throw FormatException('Unknown {} type: $typename');",
            u.name
        ));
        self.w.dedent();
        self.w.dedent();
        self.w.line("}");
        self.w.dedent();
        self.w.line("}");
        self.w.blank();
        self.w.line("Map<String, dynamic> toMap();");
        self.w.dedent();
        self.w.line("}");
        self.w.blank();

        for (member, is_union) in self.wrapped_members(u) {
            self.wrapper_decl(u, &member, is_union);
        }
    }

    /// Direct members of `u` that need a synthesized wrapper subtype:
    /// nested unions always, and objects whose base union is another
    /// union (they cannot extend `u` too).
    fn wrapped_members(&self, u: &IrUnion) -> Vec<(String, bool)> {
        let mut wrapped = Vec::new();
        for member in &u.members {
            if self.schema.union_named(member).is_some() {
                wrapped.push((member.clone(), true));
            } else if let Some(object) = self.schema.object_named(member) {
                if object.unions.first().map(String::as_str) != Some(u.name.as_str()) {
                    wrapped.push((member.clone(), false));
                }
            }
        }
        wrapped.sort_by(|a, b| a.0.cmp(&b.0));
        wrapped
    }

    fn dispatch_expr(&self, u: &IrUnion, member: &FlattenedMember) -> String {
        if let Some(nested) = member.wrapper_chain.first() {
            // Routed through the first-level nested union; its own
            // dispatcher resolves the rest of the chain.
            return format!(
                "{}({nested}.fromMap(map))",
                wrapper_name(&u.name, nested)
            );
        }
        let object = self.schema.object_named(&member.object);
        let direct_base = object
            .map(|o| o.unions.first().map(String::as_str) == Some(u.name.as_str()))
            .unwrap_or(false);
        if direct_base {
            format!("{}.fromMap(map)", member.object)
        } else {
            format!(
                "{}({}.fromMap(map))",
                wrapper_name(&u.name, &member.object),
                member.object
            )
        }
    }

    fn wrapper_decl(&mut self, u: &IrUnion, member: &str, is_union: bool) {
        let wrapper = wrapper_name(&u.name, member);
        self.w.line(format!(
            "/// Routes [{member}] values through [{}].",
            u.name
        ));
        self.w
            .line(format!("class {wrapper} extends {} {{", u.name));
        self.w.indent();
        self.w.line(format!("const {wrapper}(this.value);"));
        self.w.blank();
        self.w.line(format!("final {member} value;"));
        // Forwarding accessors for shared interface fields, so callers
        // read common data without downcasting.
        for iface_name in &u.shared_interfaces {
            let Some(iface) = self.schema.interface_named(iface_name) else {
                continue;
            };
            let forwards_statically = if is_union {
                self.schema
                    .union_named(member)
                    .map(|nested| nested.shared_interfaces.contains(iface_name))
                    .unwrap_or(false)
            } else {
                self.schema
                    .object_named(member)
                    .map(|o| o.interfaces.contains(iface_name))
                    .unwrap_or(false)
            };
            for field in sorted_fields(&iface.fields) {
                let accessor = escape(&field.name);
                let access = if forwards_statically {
                    format!("value.{accessor}")
                } else {
                    format!("(value as {iface_name}).{accessor}")
                };
                self.w.blank();
                self.w.line("@override");
                self.w.line(format!(
                    "{} get {accessor} => {access};",
                    dart_type(&field.ty)
                ));
            }
        }
        self.w.blank();
        self.w.line("@override");
        self.w
            .line("Map<String, dynamic> toMap() => value.toMap();");
        self.w.dedent();
        self.w.line("}");
        self.w.blank();
    }

    fn operation_decl(&mut self, op: &IrOperation) {
        self.w.doc(op.description.as_deref(), "/// ");
        self.w.line(format!("abstract class {} {{", op.name));
        self.w.indent();
        for (index, field) in op.fields.iter().enumerate() {
            if index > 0 {
                self.w.blank();
            }
            self.w.doc(field.description.as_deref(), "/// ");
            self.w.line(format!(
                "Future<{}> {}({});",
                dart_type(&field.return_type),
                escape(&field.name),
                self.method_params(field)
            ));
        }
        self.w.dedent();
        self.w.line("}");
        self.w.blank();
    }

    /// Parameter list for one operation field: niladic, single
    /// parameter (optional positional when nullable), or named
    /// parameters; conventional input arguments flatten to one named
    /// parameter per input field.
    fn method_params(&self, field: &IrOperationField) -> String {
        if field.args.is_empty() {
            return String::new();
        }
        if field.args.len() == 1 {
            let arg = &field.args[0];
            if let Some(input) = self.flattenable_input(&arg.name, &arg.ty) {
                return self.named_params(
                    input
                        .fields
                        .iter()
                        .map(|f| (f.name.as_str(), &f.ty))
                        .collect(),
                );
            }
            let ty = dart_type(&arg.ty);
            let name = escape(&arg.name);
            return if arg.ty.nullable {
                format!("[{ty} {name}]")
            } else {
                format!("{ty} {name}")
            };
        }
        self.named_params(
            field
                .args
                .iter()
                .map(|a| (a.name.as_str(), &a.ty))
                .collect(),
        )
    }

    /// The input type an argument flattens into, if the conventional
    /// name applies. The purchase params type is never flattened: its
    /// two variants are not expressible as independent parameters.
    fn flattenable_input(&self, arg_name: &str, ty: &IrType) -> Option<&IrInput> {
        if !FLATTENED_ARG_NAMES.contains(&arg_name) || ty.nullable {
            return None;
        }
        let IrTypeKind::Input(input_name) = &ty.kind else {
            return None;
        };
        if naming::is_purchase_params(input_name) {
            return None;
        }
        self.schema.input_named(input_name)
    }

    fn named_params(&self, params: Vec<(&str, &IrType)>) -> String {
        let mut params = params;
        params.sort_by(|a, b| a.0.cmp(b.0));
        let rendered: Vec<String> = params
            .into_iter()
            .map(|(name, ty)| {
                let rendered_ty = dart_type(ty);
                let name = escape(name);
                if ty.nullable {
                    format!("{rendered_ty} {name}")
                } else {
                    format!("required {rendered_ty} {name}")
                }
            })
            .collect();
        format!("{{{}}}", rendered.join(", "))
    }

    /// Handler typedefs plus the aggregate record bundling them as
    /// optional slots, so callers assemble partial implementations.
    fn handler_decls(&mut self, op: &IrOperation) {
        for field in &op.fields {
            self.w.line(format!(
                "typedef {} = Future<{}> Function({});",
                handler_name(&op.name, &field.name),
                dart_type(&field.return_type),
                self.method_params(field)
            ));
        }
        self.w.blank();
        self.w.line(format!(
            "/// Partial implementation of [{}]; unset slots stay null.",
            op.name
        ));
        self.w.line(format!("class {}Handlers {{", op.name));
        self.w.indent();
        if op.fields.is_empty() {
            self.w.line(format!("const {}Handlers();", op.name));
        } else {
            self.w.line(format!("const {}Handlers({{", op.name));
            self.w.indent();
            for field in &op.fields {
                self.w.line(format!("this.{},", escape(&field.name)));
            }
            self.w.dedent();
            self.w.line("});");
            self.w.blank();
            for field in &op.fields {
                self.w.line(format!(
                    "final {}? {};",
                    handler_name(&op.name, &field.name),
                    escape(&field.name)
                ));
            }
        }
        self.w.dedent();
        self.w.line("}");
        self.w.blank();
    }
}

fn wrapper_name(parent: &str, member: &str) -> String {
    format!("{parent}{}", naming::type_name_case(member))
}

fn handler_name(op: &str, field: &str) -> String {
    format!("{op}{}Handler", naming::type_name_case(field))
}

fn sorted_fields(fields: &[crate::ir::IrField]) -> Vec<&crate::ir::IrField> {
    let mut sorted: Vec<_> = fields.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::IrField;

    fn generate(schema: &IrSchema) -> String {
        generate_dart(schema, &DartOptions::default())
    }

    #[test]
    fn enum_decoder_is_total() {
        let mut schema = IrSchema::new();
        schema.enums.push(IrEnum::of(
            "ProductKind",
            &[("InApp", "in-app"), ("Subs", "subs")],
        ));
        let out = generate(&schema);
        assert!(out.contains("enum ProductKind {"));
        assert!(out.contains("inApp('in-app'),"));
        assert!(out.contains("subs('subs');"));
        assert!(out.contains("static ProductKind decode(String raw)"));
        assert!(out.contains("throw FormatException('Unknown ProductKind value: $raw');"));
        assert!(out.contains("String encode() => rawValue;"));
    }

    #[test]
    fn interface_fields_sorted_by_name() {
        let mut schema = IrSchema::new();
        schema.interfaces.push(IrInterface {
            name: "Identifiable".to_string(),
            description: None,
            fields: vec![
                IrField::new("vendorId", IrType::scalar("ID")),
                IrField::new("id", IrType::scalar("ID")),
            ],
        });
        let out = generate(&schema);
        let id = out.find("String get id;").unwrap();
        let vendor = out.find("String get vendorId;").unwrap();
        assert!(id < vendor);
    }

    #[test]
    fn object_optionality_follows_nullability() {
        let mut schema = IrSchema::new();
        schema.objects.push(
            IrObject::new("Product")
                .with_field(IrField::new("id", IrType::scalar("ID")))
                .with_field(IrField::new(
                    "description",
                    IrType::scalar("String").nullable(),
                )),
        );
        let out = generate(&schema);
        assert!(out.contains("required this.id,"));
        assert!(out.contains("this.description,"));
        assert!(out.contains("final String? description;"));
        assert!(out.contains("'__typename': 'Product',"));
        assert!(out.contains("if (description != null) 'description': description,"));
        assert!(out.contains("id: map['id'] as String,"));
    }

    #[test]
    fn platform_default_comes_from_override_table() {
        let mut schema = IrSchema::new();
        schema
            .enums
            .push(IrEnum::of("Store", &[("AppStore", "app-store")]));
        schema.objects.push(
            IrObject::new("AppStoreOffer")
                .with_field(IrField::new("store", IrType::enumeration("Store")))
                .with_field(IrField::new("price", IrType::scalar("Float"))),
        );
        let out = generate(&schema);
        assert!(out.contains("this.store = Store.appStore,"));
        assert!(
            out.contains("store: map['store'] == null ? Store.appStore : Store.decode(map['store'] as String),")
        );
    }

    #[test]
    fn legacy_shim_fields_synthesized_for_named_types_only() {
        let mut schema = IrSchema::new();
        schema
            .objects
            .push(IrObject::new("Paywall").with_field(IrField::new("id", IrType::scalar("ID"))));
        schema
            .objects
            .push(IrObject::new("Product").with_field(IrField::new("id", IrType::scalar("ID"))));
        let out = generate(&schema);
        assert!(out.contains("final bool? hasCustomPayload;"));
        assert!(out.contains("hasCustomPayload: map['hasCustomPayload'] as bool?,"));
        assert!(!out.contains("isSandbox"));
    }

    #[test]
    fn result_union_emits_marker_and_wrappers() {
        let mut schema = IrSchema::new();
        schema
            .objects
            .push(IrObject::new("Product").with_field(IrField::new("id", IrType::scalar("ID"))));
        schema
            .objects
            .push(IrObject::new("PurchaseError").with_field(IrField::new(
                "message",
                IrType::scalar("String"),
            )));
        schema.objects.push(IrObject::new("FetchProductsResult").result_union(vec![
            ResultUnionEntry {
                field_name: "products".to_string(),
                ty: IrType::list(IrType::object("Product")),
            },
            ResultUnionEntry {
                field_name: "error".to_string(),
                ty: IrType::object("PurchaseError"),
            },
        ]));
        let out = generate(&schema);
        assert!(out.contains("sealed class FetchProductsResult {"));
        assert!(out.contains("class FetchProductsResultError extends FetchProductsResult {"));
        assert!(out.contains("class FetchProductsResultProducts extends FetchProductsResult {"));
        // Entries dispatch sorted by name: error before products.
        let error = out.find("if (map.containsKey('error'))").unwrap();
        let products = out.find("if (map.containsKey('products'))").unwrap();
        assert!(error < products);
        // No generic record emitted for the supertype itself.
        assert!(!out.contains("FetchProductsResult({"));
    }

    #[test]
    fn inputs_are_write_only() {
        let mut schema = IrSchema::new();
        schema.inputs.push(
            IrInput::new("FetchParams")
                .with_field(IrField::new("ids", IrType::list(IrType::scalar("ID"))))
                .with_field(IrField::new("locale", IrType::scalar("String").nullable())),
        );
        let out = generate(&schema);
        assert!(out.contains("class FetchParams {"));
        assert!(out.contains("Map<String, dynamic> toMap()"));
        assert!(!out.contains("FetchParams.fromMap"));
        assert!(!out.contains("'__typename'"));
    }

    fn nested_union_schema() -> IrSchema {
        let mut schema = IrSchema::new();
        schema.interfaces.push(IrInterface {
            name: "Identifiable".to_string(),
            description: None,
            fields: vec![IrField::new("id", IrType::scalar("ID"))],
        });
        schema.objects.push(
            IrObject::new("ObjA")
                .with_field(IrField::new("id", IrType::scalar("ID")))
                .implements("Identifiable")
                .member_of("Outer"),
        );
        schema.objects.push(
            IrObject::new("ObjB")
                .with_field(IrField::new("id", IrType::scalar("ID")))
                .implements("Identifiable")
                .member_of("Nested"),
        );
        schema.objects.push(
            IrObject::new("ObjC")
                .with_field(IrField::new("id", IrType::scalar("ID")))
                .implements("Identifiable")
                .member_of("Nested"),
        );
        schema.unions.push(IrUnion::of("Nested", &["ObjB", "ObjC"]));
        schema
            .unions
            .push(IrUnion::of("Outer", &["ObjA", "Nested"]).sharing("Identifiable"));
        schema
    }

    #[test]
    fn union_dispatch_covers_all_reachable_members() {
        let schema = nested_union_schema();
        let out = generate(&schema);
        // One dispatcher entry per transitively reachable concrete
        // member, nested members routed through the wrapper subtype.
        assert!(out.contains("case 'ObjA':"));
        assert!(out.contains("return ObjA.fromMap(map);"));
        assert!(out.contains("case 'ObjB':"));
        assert!(out.contains("case 'ObjC':"));
        assert!(out.contains("return OuterNested(Nested.fromMap(map));"));
        assert!(out.contains("class OuterNested extends Outer {"));
        // Forwarding accessor through the shared interface.
        assert!(out.contains("String get id => (value as Identifiable).id;"));
        assert!(out.contains("throw FormatException('Unknown Outer type: $typename');"));
    }

    #[test]
    #[should_panic(expected = "reachable through more than one nesting path")]
    fn ambiguous_union_aborts_generation() {
        let mut schema = nested_union_schema();
        // ObjB is reachable directly and through Nested; emitting a
        // dispatcher for this schema would drop cases silently.
        schema.unions[1].members.insert(0, "ObjB".to_string());
        generate(&schema);
    }

    #[test]
    fn interface_typed_fields_encode_via_to_map() {
        let mut schema = IrSchema::new();
        schema.interfaces.push(IrInterface {
            name: "Payable".to_string(),
            description: None,
            fields: vec![IrField::new("amount", IrType::scalar("Float"))],
        });
        schema.objects.push(
            IrObject::new("Receipt")
                .with_field(IrField::new("item", IrType::interface("Payable"))),
        );
        let out = generate(&schema);
        // The interface declares the encode hook, so holders delegate
        // to it and the wire value stays a string-keyed map.
        assert!(out.contains("Map<String, dynamic> toMap();"));
        assert!(out.contains("'item': item.toMap(),"));
    }

    #[test]
    fn union_members_sorted_in_dispatcher() {
        let schema = nested_union_schema();
        let out = generate(&schema);
        let a = out.find("case 'ObjA':").unwrap();
        let b = out.find("case 'ObjB':").unwrap();
        let c = out.find("case 'ObjC':").unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn operations_flatten_conventional_args() {
        let mut schema = IrSchema::new();
        schema
            .objects
            .push(IrObject::new("Paywall").with_field(IrField::new("id", IrType::scalar("ID"))));
        schema.inputs.push(
            IrInput::new("FetchConfig")
                .with_field(IrField::new("placementId", IrType::scalar("ID")))
                .with_field(IrField::new("locale", IrType::scalar("String").nullable())),
        );
        schema.operations.push(
            IrOperation::new("StoreApi")
                .with_field(IrOperationField::new(
                    "paywalls",
                    IrType::list(IrType::object("Paywall")),
                ))
                .with_field(
                    IrOperationField::new("paywall", IrType::object("Paywall"))
                        .with_arg("params", IrType::input("FetchConfig")),
                )
                .with_field(
                    IrOperationField::new("lookup", IrType::object("Paywall").nullable())
                        .with_arg("id", IrType::scalar("ID").nullable()),
                ),
        );
        let out = generate(&schema);
        assert!(out.contains("Future<List<Paywall>> paywalls();"));
        // Conventional arg name + input type flattens to named params.
        assert!(out.contains(
            "Future<Paywall> paywall({String? locale, required String placementId});"
        ));
        // Single nullable arg becomes optional positional.
        assert!(out.contains("Future<Paywall?> lookup([String? id]);"));
        // Helper aliases and the aggregate record.
        assert!(out.contains(
            "typedef StoreApiPaywallsHandler = Future<List<Paywall>> Function();"
        ));
        assert!(out.contains("class StoreApiHandlers {"));
        assert!(out.contains("final StoreApiPaywallsHandler? paywalls;"));
    }

    #[test]
    fn purchase_params_never_flattened_and_hand_emitted() {
        let mut schema = IrSchema::new();
        for (_, in_app, subscription) in PURCHASE_STOREFRONTS {
            schema.inputs.push(IrInput::new(*in_app));
            schema.inputs.push(IrInput::new(*subscription));
        }
        schema.inputs.push(
            IrInput::new("PurchaseParams")
                .with_field(IrField::new("ignored", IrType::scalar("String").nullable())),
        );
        schema
            .objects
            .push(IrObject::new("Transaction").with_field(IrField::new(
                "id",
                IrType::scalar("ID"),
            )));
        schema.operations.push(
            IrOperation::new("StoreApi").with_field(
                IrOperationField::new("purchase", IrType::object("Transaction"))
                    .with_arg("params", IrType::input("PurchaseParams")),
            ),
        );
        let out = generate(&schema);
        // Hand-written hierarchy, not the generic input record.
        assert!(out.contains("sealed class PurchaseParams {"));
        assert!(out.contains("const factory PurchaseParams.inApp({"));
        assert!(out.contains("const factory PurchaseParams.subscription({"));
        assert!(out.contains("class PurchaseParamsInApp extends PurchaseParams {"));
        assert!(out.contains("'type': 'in-app',"));
        assert!(out.contains("'type': 'subs',"));
        assert!(out.contains("if (appStore != null) 'appStore': appStore!.toMap(),"));
        assert!(!out.contains("'ignored'"));
        // The operation keeps the single object parameter.
        assert!(out.contains("Future<Transaction> purchase(PurchaseParams params);"));
    }

    #[test]
    fn keywords_escaped_in_members() {
        let mut schema = IrSchema::new();
        schema.objects.push(
            IrObject::new("Filter")
                .with_field(IrField::new("in", IrType::scalar("Boolean")))
                .with_field(IrField::new("default", IrType::scalar("String").nullable())),
        );
        let out = generate(&schema);
        assert!(out.contains("final bool in_;"));
        assert!(out.contains("final String? default_;"));
        // Wire keys keep the original spelling.
        assert!(out.contains("'in': in_,"));
        assert!(out.contains("in_: map['in'] as bool,"));
    }

    #[test]
    fn generation_is_deterministic() {
        let schema = nested_union_schema();
        assert_eq!(generate(&schema), generate(&schema));
    }
}
