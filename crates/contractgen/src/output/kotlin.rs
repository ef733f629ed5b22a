//! Kotlin output backend.
//!
//! Same contract surface as the Dart backend: enums with total wire
//! codecs, capability interfaces, records with `fromMap`/`toMap`,
//! sealed result-union and union hierarchies, suspend operation
//! capabilities, and handler typealiases. Spelling of enum tags is
//! byte-identical to every other backend so independently generated
//! files agree on the contract.

use crate::emit::CodeWriter;
use crate::ir::{
    FlattenedMember, IrEnum, IrInput, IrInterface, IrObject, IrOperation, IrOperationField,
    IrSchema, IrType, IrTypeKind, IrUnion, ResultUnionEntry, flatten_union,
};
use crate::naming::{
    self, FLATTENED_ARG_NAMES, PURCHASE_KIND_TAGS, PURCHASE_SHARED_FLAG, PURCHASE_STOREFRONTS,
};
use crate::traits::Backend;

/// Kotlin hard keywords. Names colliding with these are escaped with a
/// trailing underscore.
pub const KOTLIN_KEYWORDS: &[&str] = &[
    "as", "break", "class", "continue", "do", "else", "false", "for", "fun", "if", "in",
    "interface", "is", "null", "object", "package", "return", "super", "this", "throw", "true",
    "try", "typealias", "typeof", "val", "var", "when", "while",
];

/// Options for Kotlin generation.
#[derive(Debug, Clone)]
pub struct KotlinOptions {
    /// Emit the do-not-edit header. On by default.
    pub header: bool,
    /// Package directive for the generated file.
    pub package: Option<String>,
}

impl Default for KotlinOptions {
    fn default() -> Self {
        Self {
            header: true,
            package: None,
        }
    }
}

impl KotlinOptions {
    pub fn with_package(package: impl Into<String>) -> Self {
        Self {
            package: Some(package.into()),
            ..Self::default()
        }
    }
}

/// Backend registration for Kotlin.
pub struct KotlinBackend;

pub static KOTLIN_BACKEND: KotlinBackend = KotlinBackend;

impl Backend for KotlinBackend {
    fn name(&self) -> &'static str {
        "kotlin"
    }

    fn language(&self) -> &'static str {
        "kotlin"
    }

    fn extension(&self) -> &'static str {
        "kt"
    }

    fn keywords(&self) -> &'static [&'static str] {
        KOTLIN_KEYWORDS
    }

    fn scalar_type(&self, scalar: &str) -> Option<&'static str> {
        kotlin_scalar(scalar)
    }

    fn type_name(&self, ty: &IrType, _schema: &IrSchema) -> String {
        kotlin_type(ty)
    }

    fn generate(&self, schema: &IrSchema) -> String {
        generate_kotlin(schema, &KotlinOptions::default())
    }
}

fn kotlin_scalar(scalar: &str) -> Option<&'static str> {
    match scalar {
        "String" => Some("String"),
        "ID" => Some("String"),
        "Int" => Some("Int"),
        "Float" => Some("Double"),
        "Boolean" => Some("Boolean"),
        "Json" => Some("Map<String, Any?>"),
        _ => None,
    }
}

/// Render a type occurrence in Kotlin syntax. Unmapped scalars fall
/// back to `Any?` and are logged for follow-up.
fn kotlin_type(ty: &IrType) -> String {
    let base = match &ty.kind {
        IrTypeKind::Scalar(scalar) => match kotlin_scalar(scalar) {
            Some(mapped) => mapped.to_string(),
            None => {
                tracing::warn!(scalar, backend = "kotlin", "no scalar mapping, using Any?");
                return "Any?".to_string();
            }
        },
        IrTypeKind::List(element) => format!("List<{}>", kotlin_type(element)),
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

/// The expression decoding `expr` (a wire-map value) into the Kotlin
/// type for `ty`.
fn decode_expr(ty: &IrType, expr: &str) -> String {
    match &ty.kind {
        IrTypeKind::Scalar(scalar) => match kotlin_scalar(scalar) {
            // JSON numbers may arrive as Int; route through Number.
            Some("Double") => {
                if ty.nullable {
                    format!("({expr} as Number?)?.toDouble()")
                } else {
                    format!("({expr} as Number).toDouble()")
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
                format!("{expr}?.let {{ {name}.decode(it as String) }}")
            } else {
                format!("{name}.decode({expr} as String)")
            }
        }
        IrTypeKind::Object(name) | IrTypeKind::Union(name) => {
            if ty.nullable {
                format!("{expr}?.let {{ {name}.fromMap(it as Map<String, Any?>) }}")
            } else {
                format!("{name}.fromMap({expr} as Map<String, Any?>)")
            }
        }
        // Inputs are write-only and interfaces are not instantiable; the
        // IR builder does not put them on the decode path.
        IrTypeKind::Input(_) | IrTypeKind::Interface(_) => expr.to_string(),
        IrTypeKind::List(element) => {
            let inner = decode_expr(element, "item");
            if ty.nullable {
                format!("({expr} as List<Any?>?)?.map {{ item -> {inner} }}")
            } else {
                format!("({expr} as List<Any?>).map {{ item -> {inner} }}")
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
            if element.nullable {
                let inner = encode_expr(element, "it");
                format!("{expr}.map {{ item -> item?.let {{ {inner} }} }}")
            } else {
                let inner = encode_expr(element, "item");
                format!("{expr}.map {{ item -> {inner} }}")
            }
        }
    }
}

fn escape(name: &str) -> String {
    naming::escape_keyword(name, KOTLIN_KEYWORDS).into_owned()
}

struct EmitField {
    member: String,
    wire: String,
    ty: IrType,
    default: Option<String>,
    description: Option<String>,
}

/// Generate Kotlin source for the whole schema.
pub fn generate_kotlin(schema: &IrSchema, options: &KotlinOptions) -> String {
    let mut g = KotlinGenerator {
        schema,
        w: CodeWriter::new("    "),
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
    while out.ends_with("\n\n") {
        out.pop();
    }
    out
}

struct KotlinGenerator<'a> {
    schema: &'a IrSchema,
    w: CodeWriter,
}

impl KotlinGenerator<'_> {
    fn header(&mut self, options: &KotlinOptions) {
        if options.header {
            self.w.line("// GENERATED CODE - DO NOT MODIFY BY HAND.");
            self.w
                .line("// Wire-compatible contract bindings; regenerate from the schema.");
            self.w.blank();
        }
        // Wire maps are decoded through erased generic casts.
        self.w.line("@file:Suppress(\"UNCHECKED_CAST\")");
        self.w.blank();
        if let Some(package) = &options.package {
            self.w.line(format!("package {package}"));
            self.w.blank();
        }
    }

    fn kdoc(&mut self, description: Option<&str>) {
        if description.is_none() {
            return;
        }
        self.w.line("/**");
        self.w.doc(description, " * ");
        self.w.line(" */");
    }

    fn enum_decl(&mut self, e: &IrEnum) {
        self.kdoc(e.description.as_deref());
        self.w
            .line(format!("enum class {}(val rawValue: String) {{", e.name));
        self.w.indent();
        let last = e.values.len().saturating_sub(1);
        for (index, value) in e.values.iter().enumerate() {
            self.kdoc(value.description.as_deref());
            let tag = escape(&naming::enum_value_case(&value.name));
            let separator = if index == last { ";" } else { "," };
            self.w
                .line(format!("{tag}(\"{}\"){separator}", value.raw_value));
        }
        self.w.blank();
        self.w.line("fun encode(): String = rawValue");
        self.w.blank();
        self.w.line("companion object {");
        self.w.indent();
        self.w.line("/**");
        self.w
            .line(" * Decode a wire value. Throws for an unrecognized value");
        self.w.line(" * instead of silently defaulting.");
        self.w.line(" */");
        self.w
            .line(format!("fun decode(raw: String): {} =", e.name));
        self.w.indent();
        self.w.line("entries.firstOrNull { it.rawValue == raw }");
        self.w.indent();
        self.w.line(format!(
            "?: throw IllegalArgumentException(\"Unknown {} value: $raw\")",
            e.name
        ));
        self.w.dedent();
        self.w.dedent();
        self.w.dedent();
        self.w.line("}");
        self.w.dedent();
        self.w.line("}");
        self.w.blank();
    }

    fn interface_decl(&mut self, i: &IrInterface) {
        self.kdoc(i.description.as_deref());
        self.w.line(format!("interface {} {{", i.name));
        self.w.indent();
        for field in sorted_fields(&i.fields) {
            self.kdoc(field.description.as_deref());
            self.w.line(format!(
                "val {}: {}",
                escape(&field.name),
                kotlin_type(&field.ty)
            ));
        }
        if !i.fields.is_empty() {
            self.w.blank();
        }
        // Interface-typed fields serialize through this hook.
        self.w.line("fun toMap(): Map<String, Any?>");
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

    /// Field names the class must mark `override`: everything declared
    /// by an implemented interface or forwarded by the base union's
    /// shared interfaces.
    fn overridden_fields(&self, o: &IrObject) -> Vec<String> {
        let mut names = Vec::new();
        let mut interfaces: Vec<&str> = o.interfaces.iter().map(String::as_str).collect();
        if let Some(base) = o.unions.first() {
            if let Some(union) = self.schema.union_named(base) {
                interfaces.extend(union.shared_interfaces.iter().map(String::as_str));
            }
        }
        for iface_name in interfaces {
            if let Some(iface) = self.schema.interface_named(iface_name) {
                for field in &iface.fields {
                    names.push(field.name.clone());
                }
            }
        }
        names
    }

    fn object_decl(&mut self, o: &IrObject) {
        if let Some(entries) = &o.result_union {
            self.result_union_decl(o, entries);
            return;
        }
        self.kdoc(o.description.as_deref());
        let mut supertypes: Vec<String> = Vec::new();
        let base_union = o.unions.first();
        if let Some(base) = base_union {
            supertypes.push(format!("{base}()"));
        }
        supertypes.extend(o.interfaces.iter().cloned());
        let clause = if supertypes.is_empty() {
            String::new()
        } else {
            format!(" : {}", supertypes.join(", "))
        };

        let fields = self.object_fields(o);
        let overridden = self.overridden_fields(o);
        if fields.is_empty() {
            self.w.line(format!("class {}{clause} {{", o.name));
        } else {
            self.w.line(format!("class {}(", o.name));
            self.w.indent();
            for field in &fields {
                self.kdoc(field.description.as_deref());
                let prefix = if overridden.contains(&field.wire) {
                    "override val"
                } else {
                    "val"
                };
                let (ty, default) = match &field.default {
                    Some(default) => (
                        kotlin_type(&IrType {
                            nullable: false,
                            ..field.ty.clone()
                        }),
                        format!(" = {default}"),
                    ),
                    None if field.ty.nullable => (kotlin_type(&field.ty), " = null".to_string()),
                    None => (kotlin_type(&field.ty), String::new()),
                };
                self.w
                    .line(format!("{prefix} {}: {ty}{default},", field.member));
            }
            self.w.dedent();
            self.w.line(format!("){clause} {{"));
        }
        self.w.indent();
        // The interfaces and the base union's sealed class both declare
        // toMap, so implementing classes mark it an override.
        let overrides = base_union.is_some() || !o.interfaces.is_empty();
        self.to_map(&fields, Some(&o.name), overrides);
        self.w.blank();
        self.from_map(&o.name, &fields);
        self.w.dedent();
        self.w.line("}");
        self.w.blank();
    }

    fn to_map(&mut self, fields: &[EmitField], type_tag: Option<&str>, with_override: bool) {
        let keyword = if with_override {
            "override fun"
        } else {
            "fun"
        };
        self.w
            .line(format!("{keyword} toMap(): Map<String, Any?> = buildMap {{"));
        self.w.indent();
        if let Some(tag) = type_tag {
            self.w.line(format!("put(\"__typename\", \"{tag}\")"));
        }
        for field in fields {
            if field.ty.nullable && field.default.is_none() {
                let value = encode_expr(&field.ty, "it");
                self.w.line(format!(
                    "{}?.let {{ put(\"{}\", {value}) }}",
                    field.member, field.wire
                ));
            } else {
                self.w.line(format!(
                    "put(\"{}\", {})",
                    field.wire,
                    encode_expr(&field.ty, &field.member)
                ));
            }
        }
        self.w.dedent();
        self.w.line("}");
    }

    fn from_map(&mut self, type_name: &str, fields: &[EmitField]) {
        self.w.line("companion object {");
        self.w.indent();
        if fields.is_empty() {
            self.w.line(format!(
                "fun fromMap(map: Map<String, Any?>): {type_name} = {type_name}()"
            ));
        } else {
            self.w.line(format!(
                "fun fromMap(map: Map<String, Any?>): {type_name} = {type_name}("
            ));
            self.w.indent();
            for field in fields {
                let source = format!("map[\"{}\"]", field.wire);
                let expr = match &field.default {
                    Some(default) => {
                        // Decode as nullable, then fall back to the default.
                        let as_nullable = IrType {
                            nullable: true,
                            ..field.ty.clone()
                        };
                        format!("{} ?: {default}", decode_expr(&as_nullable, &source))
                    }
                    None => decode_expr(&field.ty, &source),
                };
                self.w.line(format!("{} = {expr},", field.member));
            }
            self.w.dedent();
            self.w.line(")");
        }
        self.w.dedent();
        self.w.line("}");
    }

    fn result_union_decl(&mut self, o: &IrObject, entries: &[ResultUnionEntry]) {
        let mut entries: Vec<&ResultUnionEntry> = entries.iter().collect();
        entries.sort_by(|a, b| a.field_name.cmp(&b.field_name));

        self.kdoc(o.description.as_deref());
        self.w.line(format!("sealed class {} {{", o.name));
        self.w.indent();
        self.w.line("abstract fun toMap(): Map<String, Any?>");
        self.w.blank();
        self.w.line("companion object {");
        self.w.indent();
        self.w.line(format!(
            "fun fromMap(map: Map<String, Any?>): {} {{",
            o.name
        ));
        self.w.indent();
        for entry in &entries {
            self.w
                .line(format!("if (map.containsKey(\"{}\")) {{", entry.field_name));
            self.w.indent();
            let wrapper = wrapper_name(&o.name, &entry.field_name);
            let value = decode_expr(&entry.ty, &format!("map[\"{}\"]", entry.field_name));
            self.w.line(format!("return {wrapper}({value})"));
            self.w.dedent();
            self.w.line("}");
        }
        self.w.line(format!(
            "throw IllegalArgumentException(\"Unrecognized {} payload\")",
            o.name
        ));
        self.w.dedent();
        self.w.line("}");
        self.w.dedent();
        self.w.line("}");
        self.w.dedent();
        self.w.line("}");
        self.w.blank();

        for entry in &entries {
            let wrapper = wrapper_name(&o.name, &entry.field_name);
            let member = escape(&entry.field_name);
            self.w.line(format!(
                "/** The `{}` outcome of [{}]. */",
                entry.field_name, o.name
            ));
            self.w.line(format!(
                "class {wrapper}(val {member}: {}) : {}() {{",
                kotlin_type(&entry.ty),
                o.name
            ));
            self.w.indent();
            self.w.line(format!(
                "override fun toMap(): Map<String, Any?> = mapOf(\"{}\" to {})",
                entry.field_name,
                encode_expr(&entry.ty, &member)
            ));
            self.w.dedent();
            self.w.line("}");
            self.w.blank();
        }
    }

    fn input_decl(&mut self, i: &IrInput) {
        self.kdoc(i.description.as_deref());
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
        if fields.is_empty() {
            self.w.line(format!("class {} {{", i.name));
        } else {
            self.w.line(format!("class {}(", i.name));
            self.w.indent();
            for field in &fields {
                self.kdoc(field.description.as_deref());
                let default = if field.ty.nullable { " = null" } else { "" };
                self.w.line(format!(
                    "val {}: {}{default},",
                    field.member,
                    kotlin_type(&field.ty)
                ));
            }
            self.w.dedent();
            self.w.line(") {");
        }
        self.w.indent();
        // Inputs are write-only: no type tag, no decode companion.
        self.to_map(&fields, None, false);
        self.w.dedent();
        self.w.line("}");
        self.w.blank();
    }

    /// Hand-emitted two-variant purchase params, mirroring the Dart
    /// backend: per-storefront optional payloads plus the shared flag,
    /// serialized as nested maps plus a `type` discriminant.
    fn purchase_params_decl(&mut self, i: &IrInput) {
        let name = &i.name;
        self.kdoc(i.description.as_deref());
        self.w.line(format!("sealed class {name} {{"));
        self.w.indent();
        self.w.line("abstract fun toMap(): Map<String, Any?>");
        for (kind, tag) in PURCHASE_KIND_TAGS {
            let variant = naming::type_name_case(kind);
            self.w.blank();
            self.w.line(format!("class {variant}("));
            self.w.indent();
            for (label, in_app, subscription) in PURCHASE_STOREFRONTS {
                let payload = if *kind == "inApp" { in_app } else { subscription };
                self.w.line(format!("val {label}: {payload}? = null,"));
            }
            self.w
                .line(format!("val {PURCHASE_SHARED_FLAG}: Boolean? = null,"));
            self.w.dedent();
            self.w.line(format!(") : {name}() {{"));
            self.w.indent();
            self.w
                .line("override fun toMap(): Map<String, Any?> = buildMap {");
            self.w.indent();
            self.w.line(format!("put(\"type\", \"{tag}\")"));
            for (label, _, _) in PURCHASE_STOREFRONTS {
                self.w.line(format!(
                    "{label}?.let {{ put(\"{label}\", it.toMap()) }}"
                ));
            }
            self.w.line(format!(
                "{PURCHASE_SHARED_FLAG}?.let {{ put(\"{PURCHASE_SHARED_FLAG}\", it) }}"
            ));
            self.w.dedent();
            self.w.line("}");
            self.w.dedent();
            self.w.line("}");
        }
        self.w.dedent();
        self.w.line("}");
        self.w.blank();
    }

    fn union_decl(&mut self, u: &IrUnion) {
        // A flattening error means the schema skipped validation; abort
        // this run rather than emit a dispatcher with missing cases.
        let members = flatten_union(self.schema, u)
            .unwrap_or_else(|err| panic!("invalid schema for union `{}`: {err}", u.name));

        self.kdoc(u.description.as_deref());
        let clause = if u.shared_interfaces.is_empty() {
            String::new()
        } else {
            format!(" : {}", u.shared_interfaces.join(", "))
        };
        self.w.line(format!("sealed class {}{clause} {{", u.name));
        self.w.indent();
        // Shared interfaces already declare toMap; restating it then
        // needs the override modifier.
        if u.shared_interfaces.is_empty() {
            self.w.line("abstract fun toMap(): Map<String, Any?>");
        } else {
            self.w.line("abstract override fun toMap(): Map<String, Any?>");
        }
        self.w.blank();
        self.w.line("companion object {");
        self.w.indent();
        self.w.line(format!(
            "fun fromMap(map: Map<String, Any?>): {} =",
            u.name
        ));
        self.w.indent();
        self.w
            .line("when (val typename = map[\"__typename\"] as? String) {");
        self.w.indent();
        for member in &members {
            self.w.line(format!(
                "\"{}\" -> {}",
                member.object,
                self.dispatch_expr(u, member)
            ));
        }
        self.w.line(format!(
            "else -> throw IllegalArgumentException(\"Unknown {} type: $typename\")",
            u.name
        ));
        self.w.dedent();
        self.w.line("}");
        self.w.dedent();
        self.w.dedent();
        self.w.line("}");
        self.w.dedent();
        self.w.line("}");
        self.w.blank();

        for (member, is_union) in self.wrapped_members(u) {
            self.wrapper_decl(u, &member, is_union);
        }
    }

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
            "/** Routes [{member}] values through [{}]. */",
            u.name
        ));
        self.w.line(format!(
            "class {wrapper}(val value: {member}) : {}() {{",
            u.name
        ));
        self.w.indent();
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
                self.w.line(format!(
                    "override val {accessor}: {}",
                    kotlin_type(&field.ty)
                ));
                self.w.indent();
                self.w.line(format!("get() = {access}"));
                self.w.dedent();
                self.w.blank();
            }
        }
        self.w
            .line("override fun toMap(): Map<String, Any?> = value.toMap()");
        self.w.dedent();
        self.w.line("}");
        self.w.blank();
    }

    fn operation_decl(&mut self, op: &IrOperation) {
        self.kdoc(op.description.as_deref());
        self.w.line(format!("interface {} {{", op.name));
        self.w.indent();
        for (index, field) in op.fields.iter().enumerate() {
            if index > 0 {
                self.w.blank();
            }
            self.kdoc(field.description.as_deref());
            self.w.line(format!(
                "suspend fun {}({}): {}",
                escape(&field.name),
                self.method_params(field, true),
                kotlin_type(&field.return_type)
            ));
        }
        self.w.dedent();
        self.w.line("}");
        self.w.blank();
    }

    /// Parameter list for one operation field. `defaults` controls
    /// whether nullable parameters take `= null` (methods yes,
    /// typealias function types no).
    fn method_params(&self, field: &IrOperationField, defaults: bool) -> String {
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
                    defaults,
                );
            }
        }
        self.named_params(
            field
                .args
                .iter()
                .map(|a| (a.name.as_str(), &a.ty))
                .collect(),
            defaults,
        )
    }

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

    fn named_params(&self, params: Vec<(&str, &IrType)>, defaults: bool) -> String {
        let mut params = params;
        params.sort_by(|a, b| a.0.cmp(b.0));
        let rendered: Vec<String> = params
            .into_iter()
            .map(|(name, ty)| {
                let suffix = if defaults && ty.nullable { " = null" } else { "" };
                format!("{}: {}{suffix}", escape(name), kotlin_type(ty))
            })
            .collect();
        rendered.join(", ")
    }

    fn handler_decls(&mut self, op: &IrOperation) {
        for field in &op.fields {
            self.w.line(format!(
                "typealias {} = suspend ({}) -> {}",
                handler_name(&op.name, &field.name),
                self.method_params(field, false),
                kotlin_type(&field.return_type)
            ));
        }
        self.w.blank();
        self.w.line(format!(
            "/** Partial implementation of [{}]; unset slots stay null. */",
            op.name
        ));
        if op.fields.is_empty() {
            self.w.line(format!("class {}Handlers", op.name));
        } else {
            self.w.line(format!("class {}Handlers(", op.name));
            self.w.indent();
            for field in &op.fields {
                self.w.line(format!(
                    "val {}: {}? = null,",
                    escape(&field.name),
                    handler_name(&op.name, &field.name)
                ));
            }
            self.w.dedent();
            self.w.line(")");
        }
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
        generate_kotlin(schema, &KotlinOptions::default())
    }

    #[test]
    fn enum_tags_share_dart_spelling() {
        let mut schema = IrSchema::new();
        schema.enums.push(IrEnum::of(
            "Store",
            &[("APP_STORE", "app-store"), ("STORE_IOS", "store-ios")],
        ));
        let out = generate(&schema);
        // Same casing as every other backend, including acronyms.
        assert!(out.contains("appStore(\"app-store\"),"));
        assert!(out.contains("storeIOS(\"store-ios\");"));
        assert!(out.contains("fun decode(raw: String): Store ="));
        assert!(out.contains("?: throw IllegalArgumentException(\"Unknown Store value: $raw\")"));
    }

    #[test]
    fn object_uses_named_defaults_and_map_codec() {
        let mut schema = IrSchema::new();
        schema.objects.push(
            IrObject::new("Product")
                .with_field(IrField::new("id", IrType::scalar("ID")))
                .with_field(IrField::new("price", IrType::scalar("Float")))
                .with_field(IrField::new(
                    "description",
                    IrType::scalar("String").nullable(),
                )),
        );
        let out = generate(&schema);
        assert!(out.contains("val id: String,"));
        assert!(out.contains("val description: String? = null,"));
        assert!(out.contains("put(\"__typename\", \"Product\")"));
        assert!(out.contains("description?.let { put(\"description\", it) }"));
        assert!(out.contains("price = (map[\"price\"] as Number).toDouble(),"));
    }

    #[test]
    fn interface_membership_marks_overrides() {
        let mut schema = IrSchema::new();
        schema.interfaces.push(IrInterface {
            name: "Identifiable".to_string(),
            description: None,
            fields: vec![IrField::new("id", IrType::scalar("ID"))],
        });
        schema.objects.push(
            IrObject::new("Product")
                .with_field(IrField::new("id", IrType::scalar("ID")))
                .implements("Identifiable"),
        );
        let out = generate(&schema);
        assert!(out.contains("interface Identifiable {"));
        assert!(out.contains("val id: String"));
        assert!(out.contains("override val id: String,"));
        assert!(out.contains(") : Identifiable {"));
    }

    #[test]
    fn union_dispatch_flattens_nested_members() {
        let mut schema = IrSchema::new();
        schema.objects.push(IrObject::new("ObjA").member_of("Outer"));
        schema
            .objects
            .push(IrObject::new("ObjB").member_of("Nested"));
        schema.unions.push(IrUnion::of("Nested", &["ObjB"]));
        schema
            .unions
            .push(IrUnion::of("Outer", &["ObjA", "Nested"]));
        let out = generate(&schema);
        assert!(out.contains("sealed class Outer {"));
        assert!(out.contains("\"ObjA\" -> ObjA.fromMap(map)"));
        assert!(out.contains("\"ObjB\" -> OuterNested(Nested.fromMap(map))"));
        assert!(out.contains("class OuterNested(val value: Nested) : Outer() {"));
        assert!(out.contains("override fun toMap(): Map<String, Any?> = value.toMap()"));
        assert!(out.contains("else -> throw IllegalArgumentException(\"Unknown Outer type: $typename\")"));
    }

    #[test]
    #[should_panic(expected = "reachable through more than one nesting path")]
    fn ambiguous_union_aborts_generation() {
        let mut schema = IrSchema::new();
        schema.objects.push(IrObject::new("ObjA").member_of("Outer"));
        schema
            .objects
            .push(IrObject::new("ObjB").member_of("Nested"));
        schema.unions.push(IrUnion::of("Nested", &["ObjB"]));
        // ObjB is reachable directly and through Nested; emitting a
        // dispatcher for this schema would drop cases silently.
        schema
            .unions
            .push(IrUnion::of("Outer", &["ObjA", "Nested", "ObjB"]));
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
        // Same wire shape as the Dart backend: the interface declares
        // the encode hook and holders delegate to it.
        assert!(out.contains("fun toMap(): Map<String, Any?>"));
        assert!(out.contains("put(\"item\", item.toMap())"));
    }

    #[test]
    fn operations_emit_suspend_methods_and_typealiases() {
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
                        .with_arg("options", IrType::input("FetchConfig")),
                ),
        );
        let out = generate(&schema);
        assert!(out.contains("suspend fun paywalls(): List<Paywall>"));
        assert!(out.contains(
            "suspend fun paywall(locale: String? = null, placementId: String): Paywall"
        ));
        assert!(out.contains("typealias StoreApiPaywallsHandler = suspend () -> List<Paywall>"));
        assert!(out.contains(
            "typealias StoreApiPaywallHandler = suspend (locale: String?, placementId: String) -> Paywall"
        ));
        assert!(out.contains("val paywalls: StoreApiPaywallsHandler? = null,"));
    }

    #[test]
    fn purchase_params_hand_emitted() {
        let mut schema = IrSchema::new();
        for (_, in_app, subscription) in PURCHASE_STOREFRONTS {
            schema.inputs.push(IrInput::new(*in_app));
            schema.inputs.push(IrInput::new(*subscription));
        }
        schema.inputs.push(IrInput::new("PurchaseParams"));
        let out = generate(&schema);
        assert!(out.contains("sealed class PurchaseParams {"));
        assert!(out.contains("class InApp("));
        assert!(out.contains("class Subscription("));
        assert!(out.contains("put(\"type\", \"in-app\")"));
        assert!(out.contains("put(\"type\", \"subs\")"));
        assert!(out.contains("appStore?.let { put(\"appStore\", it.toMap()) }"));
    }

    #[test]
    fn generation_is_deterministic() {
        let mut schema = IrSchema::new();
        schema
            .enums
            .push(IrEnum::of("Store", &[("AppStore", "app-store")]));
        schema
            .objects
            .push(IrObject::new("Paywall").with_field(IrField::new("id", IrType::scalar("ID"))));
        assert_eq!(generate(&schema), generate(&schema));
    }
}
