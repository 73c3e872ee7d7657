//! Functions declared only in the rule database.

use std::sync::Arc;

use crate::{
    builder::{
        functions::{default_modifications, fix_argument_names},
        BuildContext,
    },
    codemodel::TypeInfo,
    meta::{
        FunctionAttributes, FunctionKind, MetaArgument, MetaClassRc, MetaFunction, MetaType,
        Visibility,
    },
    typesystem::{AddedAccess, AddedFunction, TypeEntryKind},
    Error, Result,
};

impl BuildContext<'_> {
    /// Translate a type named by the rule database. A missing type is a configuration error.
    fn translate_added_type(&self, info: &TypeInfo, class: Option<&MetaClassRc>) -> Result<MetaType> {
        self.translate(info, class).map_err(|error| {
            tracing::debug!(%info, %error, "added function type lookup failed");
            Error::TypeNotFound {
                name: info.qualified_name_string(),
                candidates: self.database.candidates_for(info.local_name()),
            }
        })
    }

    fn traverse_added_function(
        &self,
        added: &AddedFunction,
        class: Option<&MetaClassRc>,
    ) -> Result<MetaFunction> {
        let mut function = MetaFunction::new(added.name(), FunctionKind::Normal);
        function.attributes = FunctionAttributes::ADDED | FunctionAttributes::FINAL_IN_TARGET_LANG;
        if added.is_static() {
            function.attributes |= FunctionAttributes::STATIC;
        }
        if added.is_const() {
            function.attributes |= FunctionAttributes::CONST;
        }
        function.visibility = match added.access() {
            AddedAccess::Protected => Visibility::Protected,
            AddedAccess::Public => Visibility::Public,
        };

        if !added.return_type().is_void() {
            function.return_type = Some(self.translate_added_type(added.return_type(), class)?);
        }
        for (index, argument) in added.arguments().iter().enumerate() {
            let argument_type = self.translate_added_type(&argument.type_info, class)?;
            let mut meta_argument = MetaArgument::new(&argument.name, argument_type, index);
            meta_argument.default_value.clone_from(&argument.default_value);
            meta_argument.original_default_value.clone_from(&argument.default_value);
            function.arguments.push(meta_argument);
        }

        if function.is_operator_overload() && function.original_name != "operator()" {
            match function.arguments.len() {
                0 | 1 => {}
                2 => {
                    let second = &function.arguments[1].argument_type;
                    if class.is_some_and(|class| Arc::ptr_eq(second.type_entry(), class.type_entry())) {
                        function.attributes |= FunctionAttributes::REVERSE_OPERATOR;
                        function.arguments.pop();
                    } else {
                        tracing::warn!(
                            "Operator overload can have two arguments only if it's a reverse operator!"
                        );
                    }
                }
                _ => tracing::warn!(
                    "An operator overload need to have 0, 1 or 2 arguments if it's reverse."
                ),
            }
        }

        let Some(class) = class else {
            if !function.arguments.is_empty() {
                fix_argument_names(&mut function, &[]);
            }
            return Ok(function);
        };

        function.set_owner(class);
        let modifications = function.modifications(self.database);
        for index in 0..function.arguments.len() {
            let (replaced, removed) = default_modifications(&modifications, index + 1);
            if let Some(expression) = replaced.filter(|_| !removed) {
                let argument = &mut function.arguments[index];
                argument.default_value = Some(expression.clone());
                argument.original_default_value = Some(expression);
            }
        }
        if !function.arguments.is_empty() {
            fix_argument_names(&mut function, &modifications);
        }

        if class.is_namespace() {
            function.attributes |= FunctionAttributes::STATIC;
        }
        if function.name == class.name() {
            function.kind = FunctionKind::Constructor;
            if let [only] = function.arguments.as_slice() {
                let entry = only.argument_type.type_entry();
                if entry.kind() == TypeEntryKind::Custom {
                    function.attributes |= FunctionAttributes::EXPLICIT;
                }
                if entry.local_name() == function.name {
                    function.kind = FunctionKind::CopyConstructor;
                }
            }
        }
        Ok(function)
    }

    /// Append the functions the rule database adds to `class`.
    ///
    /// # Errors
    /// Returns [`Error::AddedFunction`] if an added function names a type that does not exist.
    pub(super) fn fill_added_functions(&mut self, class: &MetaClassRc) -> Result<()> {
        let entry = class.type_entry().clone();
        let Some(data) = entry.complex() else {
            return Ok(());
        };
        for added in data.added_functions() {
            let function = self
                .traverse_added_function(added, Some(class))
                .map_err(|error| Error::AddedFunction {
                    function: added.name().to_string(),
                    scope: class.qualified_name().to_string(),
                    source: Box::new(error),
                })?;
            tracing::trace!(class = %class.qualified_name(), function = %function.name, "added function");
            class.add_function(Arc::new(function));
        }
        Ok(())
    }

    /// Append the module level functions the rule database adds.
    ///
    /// # Errors
    /// Returns [`Error::AddedFunction`] if an added function names a type that does not exist.
    pub(super) fn fill_global_added_functions(&mut self) -> Result<()> {
        for added in self.database.global_added_functions() {
            let function = self
                .traverse_added_function(&added, None)
                .map_err(|error| Error::AddedFunction {
                    function: added.name().to_string(),
                    scope: "<global>".to_string(),
                    source: Box::new(error),
                })?;
            self.global_functions.push(Arc::new(function));
        }
        Ok(())
    }
}
