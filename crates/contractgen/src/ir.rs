//! Intermediate representation for contract schemas.
//!
//! An external schema loader normalizes raw schema documents into one
//! [`IrSchema`] per run; every output backend consumes it read-only.
//! The IR is pure data: generation never mutates it, so backends can run
//! in parallel over a shared reference.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A type occurrence: what is referenced, plus whether this particular
/// use site admits null. Nullability is per-use, not per-declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrType {
    pub kind: IrTypeKind,
    #[serde(default)]
    pub nullable: bool,
}

/// The referenced shape. `List` carries the element occurrence, so the
/// element's own nullability rides on the boxed type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IrTypeKind {
    Scalar(String),
    List(Box<IrType>),
    Enum(String),
    Object(String),
    Input(String),
    Interface(String),
    Union(String),
}

impl IrType {
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            kind: IrTypeKind::Scalar(name.into()),
            nullable: false,
        }
    }

    pub fn list(element: IrType) -> Self {
        Self {
            kind: IrTypeKind::List(Box::new(element)),
            nullable: false,
        }
    }

    pub fn enumeration(name: impl Into<String>) -> Self {
        Self {
            kind: IrTypeKind::Enum(name.into()),
            nullable: false,
        }
    }

    pub fn object(name: impl Into<String>) -> Self {
        Self {
            kind: IrTypeKind::Object(name.into()),
            nullable: false,
        }
    }

    pub fn input(name: impl Into<String>) -> Self {
        Self {
            kind: IrTypeKind::Input(name.into()),
            nullable: false,
        }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            kind: IrTypeKind::Interface(name.into()),
            nullable: false,
        }
    }

    pub fn union(name: impl Into<String>) -> Self {
        Self {
            kind: IrTypeKind::Union(name.into()),
            nullable: false,
        }
    }

    /// Mark this occurrence as nullable.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// The declaration name this occurrence references, if any.
    /// Scalars reference no declaration; lists defer to their element.
    pub fn declaration(&self) -> Option<&str> {
        match &self.kind {
            IrTypeKind::Scalar(_) => None,
            IrTypeKind::List(element) => element.declaration(),
            IrTypeKind::Enum(name)
            | IrTypeKind::Object(name)
            | IrTypeKind::Input(name)
            | IrTypeKind::Interface(name)
            | IrTypeKind::Union(name) => Some(name),
        }
    }
}

/// A named field on an interface, object, or input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrField {
    pub name: String,
    pub ty: IrType,
    #[serde(default)]
    pub description: Option<String>,
}

impl IrField {
    pub fn new(name: impl Into<String>, ty: IrType) -> Self {
        Self {
            name: name.into(),
            ty,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// One enum tag: idiomatic name plus the raw wire value it encodes to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrEnumValue {
    pub name: String,
    pub raw_value: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrEnum {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub values: Vec<IrEnumValue>,
}

impl IrEnum {
    /// Build an enum from `(name, raw_value)` pairs.
    pub fn of(name: impl Into<String>, values: &[(&str, &str)]) -> Self {
        Self {
            name: name.into(),
            description: None,
            values: values
                .iter()
                .map(|(name, raw)| IrEnumValue {
                    name: (*name).to_string(),
                    raw_value: (*raw).to_string(),
                    description: None,
                })
                .collect(),
        }
    }
}

/// A capability contract: accessors only, never instantiated directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrInterface {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub fields: Vec<IrField>,
}

/// One outcome of a result-union declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultUnionEntry {
    pub field_name: String,
    pub ty: IrType,
}

/// A concrete record. When `result_union` is set the declaration stands
/// for "exactly one of N named outcomes" and is emitted as a marker
/// supertype plus one wrapper per entry instead of a record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrObject {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<IrField>,
    /// Names of implemented interfaces.
    #[serde(default)]
    pub interfaces: Vec<String>,
    /// Union memberships. The first entry is the base when the target
    /// supports single inheritance.
    #[serde(default)]
    pub unions: Vec<String>,
    #[serde(default)]
    pub result_union: Option<Vec<ResultUnionEntry>>,
}

impl IrObject {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: Vec::new(),
            interfaces: Vec::new(),
            unions: Vec::new(),
            result_union: None,
        }
    }

    pub fn with_field(mut self, field: IrField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn member_of(mut self, union: impl Into<String>) -> Self {
        self.unions.push(union.into());
        self
    }

    pub fn result_union(mut self, entries: Vec<ResultUnionEntry>) -> Self {
        self.result_union = Some(entries);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A write-only payload: encoded to wire, never decoded back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<IrField>,
}

impl IrInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: IrField) -> Self {
        self.fields.push(field);
        self
    }
}

/// A closed polymorphic hierarchy. Members are object names or, for
/// nesting, other union names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrUnion {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub members: Vec<String>,
    /// Interfaces every member satisfies; the supertype forwards their
    /// fields so callers read common data without downcasting.
    #[serde(default)]
    pub shared_interfaces: Vec<String>,
}

impl IrUnion {
    pub fn of(name: impl Into<String>, members: &[&str]) -> Self {
        Self {
            name: name.into(),
            description: None,
            members: members.iter().map(|m| (*m).to_string()).collect(),
            shared_interfaces: Vec::new(),
        }
    }

    pub fn sharing(mut self, interface: impl Into<String>) -> Self {
        self.shared_interfaces.push(interface.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrArgument {
    pub name: String,
    pub ty: IrType,
}

/// One root field of an operation group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrOperationField {
    pub name: String,
    #[serde(default)]
    pub args: Vec<IrArgument>,
    pub return_type: IrType,
    #[serde(default)]
    pub description: Option<String>,
}

impl IrOperationField {
    pub fn new(name: impl Into<String>, return_type: IrType) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            return_type,
            description: None,
        }
    }

    pub fn with_arg(mut self, name: impl Into<String>, ty: IrType) -> Self {
        self.args.push(IrArgument {
            name: name.into(),
            ty,
        });
        self
    }
}

/// A group of root operations (one capability per field).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrOperation {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub fields: Vec<IrOperationField>,
}

impl IrOperation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: IrOperationField) -> Self {
        self.fields.push(field);
        self
    }
}

/// The complete schema handed to every backend. Built once per run,
/// read-only thereafter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IrSchema {
    #[serde(default)]
    pub enums: Vec<IrEnum>,
    #[serde(default)]
    pub interfaces: Vec<IrInterface>,
    #[serde(default)]
    pub objects: Vec<IrObject>,
    #[serde(default)]
    pub inputs: Vec<IrInput>,
    #[serde(default)]
    pub unions: Vec<IrUnion>,
    #[serde(default)]
    pub operations: Vec<IrOperation>,
}

/// A structural defect in the IR. Fatal for the whole run: the shared
/// schema is invalid independent of target.
#[derive(Debug, thiserror::Error)]
pub enum SchemaIntegrityError {
    #[error("{declaration}.{member}: unresolved reference to `{target}`")]
    UnresolvedReference {
        declaration: String,
        member: String,
        target: String,
    },
    #[error("duplicate name `{name}` in {declaration}")]
    DuplicateName { declaration: String, name: String },
    #[error("union `{union}`: member `{member}` is reachable through more than one nesting path")]
    AmbiguousUnionMember { union: String, member: String },
}

/// One transitively reachable concrete member of a union, together with
/// the chain of nested union names (outermost first) it is routed
/// through. An empty chain means a direct member.
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedMember {
    pub object: String,
    pub wrapper_chain: Vec<String>,
}

/// Flatten a union that may contain nested unions into its concrete
/// members, sorted by name. Errors if one concrete member is reachable
/// through two distinct paths: the dispatcher could not route its
/// type-tag unambiguously.
pub fn flatten_union(
    schema: &IrSchema,
    union: &IrUnion,
) -> Result<Vec<FlattenedMember>, SchemaIntegrityError> {
    fn walk(
        schema: &IrSchema,
        root: &str,
        union: &IrUnion,
        chain: &[String],
        out: &mut Vec<FlattenedMember>,
        seen: &mut HashSet<String>,
    ) -> Result<(), SchemaIntegrityError> {
        for member in &union.members {
            if let Some(nested) = schema.union_named(member) {
                let mut nested_chain = chain.to_vec();
                nested_chain.push(nested.name.clone());
                walk(schema, root, nested, &nested_chain, out, seen)?;
            } else {
                if !seen.insert(member.clone()) {
                    return Err(SchemaIntegrityError::AmbiguousUnionMember {
                        union: root.to_string(),
                        member: member.clone(),
                    });
                }
                out.push(FlattenedMember {
                    object: member.clone(),
                    wrapper_chain: chain.to_vec(),
                });
            }
        }
        Ok(())
    }

    let mut out = Vec::new();
    let mut seen = HashSet::new();
    walk(schema, &union.name, union, &[], &mut out, &mut seen)?;
    out.sort_by(|a, b| a.object.cmp(&b.object));
    Ok(out)
}

impl IrSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enum_named(&self, name: &str) -> Option<&IrEnum> {
        self.enums.iter().find(|e| e.name == name)
    }

    pub fn interface_named(&self, name: &str) -> Option<&IrInterface> {
        self.interfaces.iter().find(|i| i.name == name)
    }

    pub fn object_named(&self, name: &str) -> Option<&IrObject> {
        self.objects.iter().find(|o| o.name == name)
    }

    pub fn input_named(&self, name: &str) -> Option<&IrInput> {
        self.inputs.iter().find(|i| i.name == name)
    }

    pub fn union_named(&self, name: &str) -> Option<&IrUnion> {
        self.unions.iter().find(|u| u.name == name)
    }

    /// Check structural integrity: every reference resolves to a
    /// declaration of the right kind, names are unique within their
    /// container, and every union's concrete members are reachable
    /// through exactly one nesting path.
    ///
    /// Call once before handing the schema to backends; generation
    /// itself is infallible on a valid schema.
    pub fn validate(&self) -> Result<(), SchemaIntegrityError> {
        self.check_unique_declarations()?;

        for e in &self.enums {
            check_unique(&e.name, e.values.iter().map(|v| v.name.as_str()))?;
        }
        for i in &self.interfaces {
            check_unique(&i.name, i.fields.iter().map(|f| f.name.as_str()))?;
            for f in &i.fields {
                self.check_type(&i.name, &f.name, &f.ty)?;
            }
        }
        for o in &self.objects {
            check_unique(&o.name, o.fields.iter().map(|f| f.name.as_str()))?;
            for f in &o.fields {
                self.check_type(&o.name, &f.name, &f.ty)?;
            }
            for iface in &o.interfaces {
                if self.interface_named(iface).is_none() {
                    return Err(unresolved(&o.name, "implements", iface));
                }
            }
            for u in &o.unions {
                if self.union_named(u).is_none() {
                    return Err(unresolved(&o.name, "unions", u));
                }
            }
            if let Some(entries) = &o.result_union {
                check_unique(&o.name, entries.iter().map(|e| e.field_name.as_str()))?;
                for entry in entries {
                    self.check_type(&o.name, &entry.field_name, &entry.ty)?;
                }
            }
        }
        for i in &self.inputs {
            check_unique(&i.name, i.fields.iter().map(|f| f.name.as_str()))?;
            for f in &i.fields {
                self.check_type(&i.name, &f.name, &f.ty)?;
            }
        }
        for u in &self.unions {
            check_unique(&u.name, u.members.iter().map(|m| m.as_str()))?;
            for m in &u.members {
                if self.object_named(m).is_none() && self.union_named(m).is_none() {
                    return Err(unresolved(&u.name, "members", m));
                }
            }
            for iface in &u.shared_interfaces {
                if self.interface_named(iface).is_none() {
                    return Err(unresolved(&u.name, "sharedInterfaces", iface));
                }
            }
            flatten_union(self, u)?;
        }
        for op in &self.operations {
            check_unique(&op.name, op.fields.iter().map(|f| f.name.as_str()))?;
            for f in &op.fields {
                check_unique(
                    &format!("{}.{}", op.name, f.name),
                    f.args.iter().map(|a| a.name.as_str()),
                )?;
                self.check_type(&op.name, &f.name, &f.return_type)?;
                for arg in &f.args {
                    self.check_type(&op.name, &format!("{}({})", f.name, arg.name), &arg.ty)?;
                }
            }
        }
        Ok(())
    }

    fn check_unique_declarations(&self) -> Result<(), SchemaIntegrityError> {
        let mut seen = HashSet::new();
        let names = self
            .enums
            .iter()
            .map(|e| e.name.as_str())
            .chain(self.interfaces.iter().map(|i| i.name.as_str()))
            .chain(self.objects.iter().map(|o| o.name.as_str()))
            .chain(self.inputs.iter().map(|i| i.name.as_str()))
            .chain(self.unions.iter().map(|u| u.name.as_str()))
            .chain(self.operations.iter().map(|o| o.name.as_str()));
        for name in names {
            if !seen.insert(name) {
                return Err(SchemaIntegrityError::DuplicateName {
                    declaration: "schema".to_string(),
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }

    fn check_type(
        &self,
        declaration: &str,
        member: &str,
        ty: &IrType,
    ) -> Result<(), SchemaIntegrityError> {
        let resolves = match &ty.kind {
            IrTypeKind::Scalar(_) => true,
            IrTypeKind::List(element) => {
                return self.check_type(declaration, member, element);
            }
            IrTypeKind::Enum(name) => self.enum_named(name).is_some(),
            IrTypeKind::Object(name) => self.object_named(name).is_some(),
            IrTypeKind::Input(name) => self.input_named(name).is_some(),
            IrTypeKind::Interface(name) => self.interface_named(name).is_some(),
            IrTypeKind::Union(name) => self.union_named(name).is_some(),
        };
        if resolves {
            Ok(())
        } else {
            Err(unresolved(
                declaration,
                member,
                ty.declaration().unwrap_or_default(),
            ))
        }
    }
}

fn unresolved(declaration: &str, member: &str, target: &str) -> SchemaIntegrityError {
    SchemaIntegrityError::UnresolvedReference {
        declaration: declaration.to_string(),
        member: member.to_string(),
        target: target.to_string(),
    }
}

fn check_unique<'a>(
    declaration: &str,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), SchemaIntegrityError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(SchemaIntegrityError::DuplicateName {
                declaration: declaration.to_string(),
                name: name.to_string(),
            });
        }
    }
    Ok(())
}
