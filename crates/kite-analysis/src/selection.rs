//! Selection representation for selector expressions.
//!
//! A Selection describes a selector expression x.f that was resolved by
//! field or method lookup. Qualified identifiers (pkg.Name) are recorded
//! as uses, not selections.

use std::fmt;

use crate::objects::{ObjKey, TCObjects, TypeKey};
use crate::typ;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SelectionKind {
    /// x.f is a struct field selector.
    FieldVal,
    /// x.f is a method selector with a bound receiver.
    MethodVal,
    /// T.f is a method expression.
    MethodExpr,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    kind: SelectionKind,
    recv: TypeKey,
    obj: ObjKey,
    indices: Vec<usize>,
    indirect: bool,
}

impl Selection {
    pub fn new(kind: SelectionKind, recv: TypeKey, obj: ObjKey, indices: Vec<usize>, indirect: bool) -> Selection {
        Selection {
            kind,
            recv,
            obj,
            indices,
            indirect,
        }
    }

    pub fn kind(&self) -> SelectionKind {
        self.kind
    }

    /// The type of x in x.f.
    pub fn recv(&self) -> TypeKey {
        self.recv
    }

    /// The selected field or method. For methods of generic receivers this
    /// is the specialized copy.
    pub fn obj(&self) -> ObjKey {
        self.obj
    }

    /// The path from x to f: field indices through embedded fields, ending
    /// with the index of the field or method itself.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Reports whether a pointer indirection was required to reach f.
    pub fn indirect(&self) -> bool {
        self.indirect
    }

    pub fn fmt(&self, f: &mut fmt::Formatter<'_>, objs: &TCObjects) -> fmt::Result {
        f.write_str(match self.kind {
            SelectionKind::FieldVal => "field (",
            SelectionKind::MethodVal => "method (",
            SelectionKind::MethodExpr => "method expr (",
        })?;
        typ::fmt_type(self.recv, f, objs)?;
        let obj = &objs.lobjs[self.obj];
        write!(f, ") {}", obj.name())?;
        if let Some(t) = obj.typ() {
            match objs.types[t].try_as_signature() {
                Some(sig) => typ::fmt_signature(sig, f, objs)?,
                None => {
                    f.write_str(" ")?;
                    typ::fmt_type(t, f, objs)?;
                }
            }
        }
        Ok(())
    }
}

pub struct SelectionDisplay<'a> {
    pub selection: &'a Selection,
    pub objs: &'a TCObjects,
}

impl fmt::Display for SelectionDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.selection.fmt(f, self.objs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typ::BasicType;
    use kite_common::span::Span;

    #[test]
    fn test_field_selection_display() {
        let mut objs = TCObjects::new();
        let int = objs.basic_type(BasicType::Int);
        let x = objs.new_field(Span::dummy(), None, "X".into(), Some(int), false);
        let s = objs.new_t_struct(vec![x]);
        let sel = Selection::new(SelectionKind::FieldVal, s, x, vec![0], false);
        let shown = SelectionDisplay {
            selection: &sel,
            objs: &objs,
        }
        .to_string();
        assert_eq!(shown, "field (struct{X int}) X int");
        assert_eq!(sel.indices(), &[0]);
        assert!(!sel.indirect());
    }
}
