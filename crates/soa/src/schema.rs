/// Declare a table schema.
///
/// Generates four types from one field list:
/// - the row struct (`id: Key` plus every listed column),
/// - the columns struct (one `Vec` per column) implementing [`Columns`](crate::Columns),
/// - a patch struct with every non-key column as `Option<T>`,
/// - a bulk struct with every non-key column as `Option<&[T]>`.
///
/// ```
/// playback_soa::columnar_schema! {
///     /// A marker on the map.
///     pub struct Marker in MarkerColumns, MarkerPatch, MarkerBulk {
///         x: i32,
///         y: i32,
///     }
/// }
///
/// let mut table = playback_soa::Table::<MarkerColumns>::new();
/// table.insert_bulk([Marker { id: 4, x: 1, y: 2 }]).unwrap();
/// table.alter(4, &MarkerPatch { x: Some(9), ..Default::default() }).unwrap();
/// assert_eq!(table.lookup(4).unwrap().x, 9);
/// ```
#[macro_export]
macro_rules! columnar_schema {
    (
        $(#[$meta:meta])*
        $vis:vis struct $row:ident in $cols:ident, $patch:ident, $bulk:ident {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        $vis struct $row {
            pub id: $crate::Key,
            $( $(#[$fmeta])* pub $field: $ty, )+
        }

        #[doc = concat!("Column-major storage for [`", stringify!($row), "`] rows.")]
        #[derive(Debug, Clone, Default, PartialEq, Eq)]
        $vis struct $cols {
            pub id: ::std::vec::Vec<$crate::Key>,
            $( pub $field: ::std::vec::Vec<$ty>, )+
        }

        #[doc = concat!("Partial update of one [`", stringify!($row), "`].")]
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        $vis struct $patch {
            $( pub $field: ::std::option::Option<$ty>, )+
        }

        #[doc = concat!("Scatter write across many [`", stringify!($row), "`] rows.")]
        #[derive(Debug, Clone, Copy, Default)]
        $vis struct $bulk<'a> {
            $( pub $field: ::std::option::Option<&'a [$ty]>, )+
        }

        impl $crate::Columns for $cols {
            type Row = $row;
            type Patch = $patch;
            type Bulk<'a> = $bulk<'a>;

            const NAMES: &'static [&'static str] = &["id", $( stringify!($field) ),+];

            fn len(&self) -> usize {
                self.id.len()
            }

            fn ids(&self) -> &[$crate::Key] {
                &self.id
            }

            fn row_key(row: &$row) -> $crate::Key {
                row.id
            }

            fn row(&self, index: usize) -> $row {
                $row {
                    id: self.id[index],
                    $( $field: self.$field[index], )+
                }
            }

            fn push(&mut self, row: $row) {
                self.id.push(row.id);
                $( self.$field.push(row.$field); )+
            }

            fn patch(&mut self, index: usize, patch: &$patch) {
                $(
                    if let ::std::option::Option::Some(value) = patch.$field {
                        self.$field[index] = value;
                    }
                )+
            }

            fn bulk_lengths(bulk: &$bulk<'_>) -> ::std::vec::Vec<(&'static str, usize)> {
                let mut lengths = ::std::vec::Vec::new();
                $(
                    if let ::std::option::Option::Some(column) = bulk.$field {
                        lengths.push((stringify!($field), column.len()));
                    }
                )+
                lengths
            }

            fn scatter(&mut self, index: usize, bulk: &$bulk<'_>, source: usize) {
                $(
                    if let ::std::option::Option::Some(column) = bulk.$field {
                        self.$field[index] = column[source];
                    }
                )+
            }

            fn swap_remove(&mut self, index: usize) {
                self.id.swap_remove(index);
                $( self.$field.swap_remove(index); )+
            }

            fn clear(&mut self) {
                self.id.clear();
                $( self.$field.clear(); )+
            }

            fn reserve(&mut self, additional: usize) {
                self.id.reserve(additional);
                $( self.$field.reserve(additional); )+
            }

            fn copy_from(&mut self, other: &Self) {
                self.id.clone_from(&other.id);
                $( self.$field.clone_from(&other.$field); )+
            }
        }
    };
}
