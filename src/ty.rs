// Copyright (c) 2024-2026 The ssir developers

//! Types of values.
//!
//! Types are interned in a per-function `TypeTable` and referred to by opaque
//! `Type` keys, so type equality is key equality.

use crate::{impl_table_key, table::PrimaryTable};
use std::collections::HashMap;

impl_table_key! {
    /// A type.
    struct Type(u32) as "t";
}

/// The storage class of a pointer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StorageClass {
    /// Storage local to the current function invocation.
    Function,
    /// Module-private storage.
    Private,
    /// Pipeline input.
    Input,
    /// Pipeline output.
    Output,
    /// Uniform buffer storage.
    Uniform,
}

/// Internal table storage for types.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    /// The `void` type.
    Void,
    /// The boolean type.
    Bool,
    /// An integer type like `i32`.
    Int(u16),
    /// A floating-point type like `f32`.
    Float(u16),
    /// A vector type like `<4 x f32>`.
    Vector {
        /// The element type.
        elem: Type,
        /// The number of elements.
        len: u32,
    },
    /// A matrix type, a collection of column vectors.
    Matrix {
        /// The column vector type.
        column: Type,
        /// The number of columns.
        cols: u32,
    },
    /// An array type with a fixed length.
    Array {
        /// The element type.
        elem: Type,
        /// The number of elements.
        len: u32,
    },
    /// A struct type.
    Struct(Vec<Type>),
    /// A pointer type.
    Pointer {
        /// The type pointed to.
        pointee: Type,
        /// The storage class of the pointed-to memory.
        class: StorageClass,
    },
}

/// A structural type interner.
#[derive(Default)]
pub struct TypeTable {
    data: PrimaryTable<Type, TypeData>,
    interned: HashMap<TypeData, Type>,
}

impl TypeTable {
    /// Create a new type table.
    pub fn new() -> Self {
        Default::default()
    }

    /// Intern a type, returning the key of the structurally identical entry
    /// if one already exists.
    pub fn intern(&mut self, data: TypeData) -> Type {
        if let Some(&ty) = self.interned.get(&data) {
            return ty;
        }
        let ty = self.data.add(data.clone());
        self.interned.insert(data, ty);
        ty
    }

    /// Intern the `void` type.
    pub fn void(&mut self) -> Type {
        self.intern(TypeData::Void)
    }

    /// Intern the boolean type.
    pub fn bool(&mut self) -> Type {
        self.intern(TypeData::Bool)
    }

    /// Intern an integer type of the given bit width.
    pub fn int(&mut self, width: u16) -> Type {
        self.intern(TypeData::Int(width))
    }

    /// Intern a floating-point type of the given bit width.
    pub fn float(&mut self, width: u16) -> Type {
        self.intern(TypeData::Float(width))
    }

    /// Intern a vector type.
    pub fn vector(&mut self, elem: Type, len: u32) -> Type {
        self.intern(TypeData::Vector { elem, len })
    }

    /// Intern a matrix type.
    pub fn matrix(&mut self, column: Type, cols: u32) -> Type {
        self.intern(TypeData::Matrix { column, cols })
    }

    /// Intern an array type.
    pub fn array(&mut self, elem: Type, len: u32) -> Type {
        self.intern(TypeData::Array { elem, len })
    }

    /// Intern a struct type.
    pub fn strukt(&mut self, members: Vec<Type>) -> Type {
        self.intern(TypeData::Struct(members))
    }

    /// Intern a pointer type.
    pub fn pointer(&mut self, pointee: Type, class: StorageClass) -> Type {
        self.intern(TypeData::Pointer { pointee, class })
    }

    /// Get the data of a type.
    pub fn data(&self, ty: Type) -> &TypeData {
        &self.data[ty]
    }

    /// Get the pointee of a pointer type.
    pub fn pointee(&self, ty: Type) -> Option<Type> {
        match *self.data(ty) {
            TypeData::Pointer { pointee, .. } => Some(pointee),
            _ => None,
        }
    }

    /// Get the storage class of a pointer type.
    pub fn storage_class(&self, ty: Type) -> Option<StorageClass> {
        match *self.data(ty) {
            TypeData::Pointer { class, .. } => Some(class),
            _ => None,
        }
    }

    /// Check whether a type is `void`.
    pub fn is_void(&self, ty: Type) -> bool {
        *self.data(ty) == TypeData::Void
    }

    /// Check whether a type is a scalar: boolean, integer, or float.
    pub fn is_scalar(&self, ty: Type) -> bool {
        match *self.data(ty) {
            TypeData::Bool | TypeData::Int(_) | TypeData::Float(_) => true,
            _ => false,
        }
    }
}
