use std::fmt;

use serde::Serialize;

/// A meaningful difference between two schemas. Changes have a direction: from the expected
/// schema to the actual one. `RemoveField` means the field exists in the expected schema but not
/// in the actual one.
#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Debug, Serialize)]
pub struct Change {
    // /!\ The order of fields matters for the PartialOrd derive /!\
    /// Where the change happened. Dot separated: `Type.field.argument`, `@directive.argument`,
    /// or `schema` for the schema definition.
    pub path: String,
    /// The nature of the change.
    pub kind: ChangeKind,
    /// Contents depend on the change kind:
    ///
    /// - type, field and argument changes: the new type
    /// - default value changes: the new default, empty when removed
    /// - directive application changes: the application, such as `@key(fields: "id")`
    /// - directive definition location changes: the new locations
    /// - description changes: the new description, empty when removed
    /// - everything else: empty
    pub detail: String,
}

impl Change {
    pub(crate) fn new(path: impl Into<String>, kind: ChangeKind) -> Self {
        Change {
            path: path.into(),
            kind,
            detail: String::new(),
        }
    }

    pub(crate) fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.kind.description())?;
        if !self.detail.is_empty() {
            write!(f, " `{}`", self.detail)?;
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Debug, Serialize)]
#[allow(missing_docs)]
pub enum ChangeKind {
    // /!\ The order of variants matters for the PartialOrd derive /!\
    ChangeQueryType,
    ChangeMutationType,
    ChangeSubscriptionType,
    ChangeTypeKind,
    RemoveObjectType,
    AddObjectType,
    AddInterfaceImplementation,
    RemoveInterfaceImplementation,
    ChangeFieldType,
    RemoveField,
    AddField,
    AddUnion,
    RemoveUnion,
    AddUnionMember,
    RemoveUnionMember,
    AddEnum,
    RemoveEnum,
    AddEnumValue,
    RemoveEnumValue,
    AddScalar,
    RemoveScalar,
    AddInterface,
    RemoveInterface,
    AddDirectiveDefinition,
    RemoveDirectiveDefinition,
    ChangeDirectiveRepeatable,
    ChangeDirectiveLocations,
    AddInputObject,
    RemoveInputObject,
    AddFieldArgument,
    RemoveFieldArgument,
    AddFieldArgumentDefault,
    RemoveFieldArgumentDefault,
    ChangeFieldArgumentDefault,
    ChangeFieldArgumentType,
    AddDirectiveApplication,
    RemoveDirectiveApplication,
    ChangeDescription,
}

impl ChangeKind {
    pub fn description(&self) -> &'static str {
        match self {
            ChangeKind::ChangeQueryType => "query root type changed",
            ChangeKind::ChangeMutationType => "mutation root type changed",
            ChangeKind::ChangeSubscriptionType => "subscription root type changed",
            ChangeKind::ChangeTypeKind => "type kind changed",
            ChangeKind::RemoveObjectType => "object type removed",
            ChangeKind::AddObjectType => "object type added",
            ChangeKind::AddInterfaceImplementation => "interface implementation added",
            ChangeKind::RemoveInterfaceImplementation => "interface implementation removed",
            ChangeKind::ChangeFieldType => "field type changed",
            ChangeKind::RemoveField => "field removed",
            ChangeKind::AddField => "field added",
            ChangeKind::AddUnion => "union added",
            ChangeKind::RemoveUnion => "union removed",
            ChangeKind::AddUnionMember => "union member added",
            ChangeKind::RemoveUnionMember => "union member removed",
            ChangeKind::AddEnum => "enum added",
            ChangeKind::RemoveEnum => "enum removed",
            ChangeKind::AddEnumValue => "enum value added",
            ChangeKind::RemoveEnumValue => "enum value removed",
            ChangeKind::AddScalar => "scalar added",
            ChangeKind::RemoveScalar => "scalar removed",
            ChangeKind::AddInterface => "interface added",
            ChangeKind::RemoveInterface => "interface removed",
            ChangeKind::AddDirectiveDefinition => "directive definition added",
            ChangeKind::RemoveDirectiveDefinition => "directive definition removed",
            ChangeKind::ChangeDirectiveRepeatable => "directive repeatability changed",
            ChangeKind::ChangeDirectiveLocations => "directive locations changed",
            ChangeKind::AddInputObject => "input object added",
            ChangeKind::RemoveInputObject => "input object removed",
            ChangeKind::AddFieldArgument => "argument added",
            ChangeKind::RemoveFieldArgument => "argument removed",
            ChangeKind::AddFieldArgumentDefault => "argument default added",
            ChangeKind::RemoveFieldArgumentDefault => "argument default removed",
            ChangeKind::ChangeFieldArgumentDefault => "argument default changed",
            ChangeKind::ChangeFieldArgumentType => "argument type changed",
            ChangeKind::AddDirectiveApplication => "directive added",
            ChangeKind::RemoveDirectiveApplication => "directive removed",
            ChangeKind::ChangeDescription => "description changed",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}
