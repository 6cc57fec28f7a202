//! INI runtime shared by every section of one generated source
//!
//! A small scanner over the whole buffer plus string helpers. Helper groups
//! are only emitted when some key needs them.

use super::CodeWriter;
use crate::schema::{Schema, SemanticType};

/// Which optional helper groups the schema's keys need.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Features {
    /// Any string or string list key
    pub strings: bool,
    /// Strings copied to the heap while parsing
    pub heap_strings: bool,
    /// `char*` defaults
    pub strdup: bool,
    /// Any string list key
    pub lists: bool,
    /// `char**` keys
    pub dyn_lists: bool,
    pub bools: bool,
}

impl Features {
    pub(crate) fn of(schema: &Schema) -> Self {
        let mut features = Features::default();
        let types = schema
            .sections
            .iter()
            .flat_map(|section| section.keys.iter().map(|key| key.ty));
        for ty in types {
            features.strings |= ty.is_string() || ty.is_string_list();
            features.lists |= ty.is_string_list();
            match ty {
                SemanticType::DynStr => {
                    features.heap_strings = true;
                    features.strdup = true;
                }
                SemanticType::CustomStr(_) | SemanticType::CustomStrList(_) => {
                    features.heap_strings = true;
                }
                SemanticType::DynStrList => {
                    features.heap_strings = true;
                    features.dyn_lists = true;
                }
                SemanticType::Bool => features.bools = true,
                SemanticType::FixedStr { .. }
                | SemanticType::FixedStrList { .. }
                | SemanticType::Int(_)
                | SemanticType::Float => {}
            }
        }
        features
    }
}

pub(crate) const INCLUDES: &[&str] = &[
    "#include <ctype.h>",
    "#include <stdarg.h>",
    "#include <stdbool.h>",
    "#include <stdint.h>",
    "#include <stdio.h>",
    "#include <stdlib.h>",
    "#include <string.h>",
];

const SCANNER: &str = r#"struct str_view
{
    int off;
    int len;
};

enum token
{
    TOK_ERROR = -1,
    TOK_END = 0,
    TOK_LBRACKET = '[',
    TOK_RBRACKET = ']',
    TOK_EQUALS = '=',
    TOK_COMMA = ',',
    TOK_INTEGER = 256,
    TOK_FLOAT,
    TOK_STRING,
    TOK_KEY
};

struct c_ini_parser
{
    const char* filename;
    const char* source;
    int head, tail, end;
    union
    {
        struct str_view string;
        double float_literal;
        int64_t integer_literal;
    } value;
};

static struct str_view str_view(int off, int len)
{
    struct str_view view;
    view.off = off;
    view.len = len;
    return view;
}

static int str_view_equal(const char* source, struct str_view view, const char* cstr)
{
    return (int)strlen(cstr) == view.len && memcmp(source + view.off, cstr, view.len) == 0;
}

static void parser_init(struct c_ini_parser* p, const char* filename, const char* data, int len)
{
    p->filename = filename;
    p->source = data;
    p->head = 0;
    p->tail = 0;
    p->end = len;
}

static void print_excerpt(const struct c_ini_parser* p, struct str_view loc)
{
    int line_start = loc.off, line_end = loc.off, line = 1, i;
    while (line_start > 0 && p->source[line_start - 1] != '\n')
        line_start--;
    while (line_end < p->end && p->source[line_end] != '\n')
        line_end++;
    for (i = 0; i < line_start; ++i)
        if (p->source[i] == '\n')
            line++;
    fprintf(stderr, "%5d | %.*s\n", line, line_end - line_start, p->source + line_start);
    fprintf(stderr, "      | %*s^", loc.off - line_start, "");
    for (i = 1; i < loc.len && loc.off + i < line_end; ++i)
        putc('~', stderr);
    putc('\n', stderr);
}

static int parser_error(struct c_ini_parser* p, const char* fmt, ...)
{
    va_list ap;
    int line = 1, col = 1, i;
    for (i = 0; i < p->tail; ++i)
    {
        if (p->source[i] == '\n')
        {
            line++;
            col = 1;
        }
        else
            col++;
    }
    fprintf(stderr, "%s:%d:%d: error: ", p->filename, line, col);
    va_start(ap, fmt);
    vfprintf(stderr, fmt, ap);
    va_end(ap);
    print_excerpt(p, str_view(p->tail, p->head - p->tail));
    return TOK_ERROR;
}

static int is_key_char(char c)
{
    return isalnum((unsigned char)c) || c == '_' || c == '-';
}

static enum token finish_integer(struct c_ini_parser* p, uint64_t value, int negative)
{
    if (value > (uint64_t)INT64_MAX + negative)
        return (enum token)parser_error(p, "Integer literal is too large\n");
    if (negative)
        p->value.integer_literal = value == (uint64_t)INT64_MAX + 1 ? INT64_MIN : -(int64_t)value;
    else
        p->value.integer_literal = (int64_t)value;
    return TOK_INTEGER;
}

static enum token scan_number(struct c_ini_parser* p)
{
    const char* s = p->source;
    int negative = 0, is_float = 0;
    uint64_t value = 0;
    if (s[p->head] == '-')
    {
        negative = 1;
        p->head++;
    }
    if (p->end - p->head > 1 && s[p->head] == '0' && (s[p->head + 1] == 'x' || s[p->head + 1] == 'X'))
    {
        int digits = 0;
        p->head += 2;
        while (p->head != p->end && isxdigit((unsigned char)s[p->head]))
        {
            int c = (unsigned char)s[p->head++];
            int digit = isdigit(c) ? c - '0' : tolower(c) - 'a' + 10;
            if (value > (UINT64_MAX >> 4))
                return (enum token)parser_error(p, "Integer literal is too large\n");
            value = value * 16 + (uint64_t)digit;
            digits++;
        }
        if (digits == 0)
            return (enum token)parser_error(p, "Expected hex digits after '0x'\n");
        return finish_integer(p, value, negative);
    }
    while (p->head != p->end && isdigit((unsigned char)s[p->head]))
    {
        uint64_t digit = (uint64_t)(s[p->head++] - '0');
        if (value > (UINT64_MAX - digit) / 10)
            is_float = 2;
        value = value * 10 + digit;
    }
    if (p->end - p->head > 1 && s[p->head] == '.' && isdigit((unsigned char)s[p->head + 1]))
    {
        is_float = 1;
        p->head++;
        while (p->head != p->end && isdigit((unsigned char)s[p->head]))
            p->head++;
    }
    if (p->head != p->end && (s[p->head] == 'e' || s[p->head] == 'E'))
    {
        int exp = p->head + 1;
        if (exp != p->end && (s[exp] == '+' || s[exp] == '-'))
            exp++;
        if (exp != p->end && isdigit((unsigned char)s[exp]))
        {
            is_float = 1;
            p->head = exp;
            while (p->head != p->end && isdigit((unsigned char)s[p->head]))
                p->head++;
        }
    }
    if (is_float == 2)
        return (enum token)parser_error(p, "Integer literal is too large\n");
    if (is_float)
    {
        char buf[64];
        int len = p->head - p->tail;
        if (len >= (int)sizeof buf)
            return (enum token)parser_error(p, "Float literal is too long\n");
        memcpy(buf, s + p->tail, (size_t)len);
        buf[len] = '\0';
        p->value.float_literal = strtod(buf, NULL);
        if (p->head != p->end && s[p->head] == 'f')
            p->head++;
        return TOK_FLOAT;
    }
    return finish_integer(p, value, negative);
}

static enum token scan_string(struct c_ini_parser* p)
{
    int start = ++p->head;
    for (; p->head != p->end; ++p->head)
    {
        if (p->source[p->head] == '"' && p->source[p->head - 1] != '\\')
        {
            p->value.string = str_view(start, p->head - start);
            p->head++;
            return TOK_STRING;
        }
    }
    return (enum token)parser_error(p, "Missing closing quote on string literal\n");
}

static enum token scan_next(struct c_ini_parser* p)
{
    const char* s = p->source;
    while (p->head != p->end)
    {
        char c = s[p->head];
        p->tail = p->head;
        if (c == '#' || c == ';')
        {
            while (p->head != p->end && s[p->head] != '\n')
                p->head++;
            continue;
        }
        if (c == '[' || c == ']' || c == '=' || c == ',')
        {
            p->head++;
            return (enum token)c;
        }
        if (isdigit((unsigned char)c)
            || (c == '-' && p->end - p->head > 1 && isdigit((unsigned char)s[p->head + 1])))
            return scan_number(p);
        if (c == '"')
            return scan_string(p);
        if (isalpha((unsigned char)c) || c == '_' || c == '-')
        {
            while (p->head != p->end && is_key_char(s[p->head]))
                p->head++;
            p->value.string = str_view(p->tail, p->head - p->tail);
            return TOK_KEY;
        }
        p->head++;
    }
    p->tail = p->head;
    return TOK_END;
}

static int expect_equals(struct c_ini_parser* p)
{
    enum token tok = scan_next(p);
    if (tok == TOK_ERROR)
        return -1;
    if (tok != TOK_EQUALS)
    {
        parser_error(p, "Expected \"=\" after key\n");
        return -1;
    }
    return 0;
}
"#;

const STRINGS: &str = r#"
static int unescaped_len(const char* source, struct str_view view)
{
    int i, len = 0;
    for (i = 0; i < view.len; ++i, ++len)
        if (source[view.off + i] == '\\' && i + 1 < view.len && source[view.off + i + 1] == '"')
            ++i;
    return len;
}

static void unescape_copy(char* dst, const char* source, struct str_view view)
{
    int i;
    for (i = 0; i < view.len; ++i)
    {
        if (source[view.off + i] == '\\' && i + 1 < view.len && source[view.off + i + 1] == '"')
            ++i;
        *dst++ = source[view.off + i];
    }
    *dst = '\0';
}

static void write_string(FILE* f, const char* data, int len)
{
    int i;
    putc('"', f);
    for (i = 0; i < len; ++i)
    {
        if (data[i] == '"')
            putc('\\', f);
        putc(data[i], f);
    }
    putc('"', f);
}

static void write_cstr(FILE* f, const char* str)
{
    write_string(f, str ? str : "", str ? (int)strlen(str) : 0);
}
"#;

const HEAP_STRINGS: &str = r#"
static char* unescape_dup(const char* source, struct str_view view)
{
    char* copy = malloc((size_t)unescaped_len(source, view) + 1);
    if (copy != NULL)
        unescape_copy(copy, source, view);
    return copy;
}
"#;

const STRDUP: &str = r#"
static char* portable_strdup(const char* str)
{
    size_t len = strlen(str) + 1;
    char* copy = malloc(len);
    if (copy != NULL)
        memcpy(copy, str, len);
    return copy;
}
"#;

const LISTS: &str = r#"
static enum token peek_next(struct c_ini_parser* p)
{
    int head = p->head, tail = p->tail;
    enum token tok = scan_next(p);
    if (tok != TOK_ERROR)
    {
        p->head = head;
        p->tail = tail;
    }
    return tok;
}

/* Validate a possibly empty "a", "b", ... list without storing it. Strings
 * longer than max_len (when non-negative) are rejected. */
static int count_string_list(struct c_ini_parser* p, int max_len, int* count)
{
    enum token tok = peek_next(p);
    *count = 0;
    if (tok == TOK_ERROR)
        return -1;
    if (tok != TOK_STRING)
        return 0;
    while (1)
    {
        tok = scan_next(p);
        if (tok == TOK_ERROR)
            return -1;
        if (tok != TOK_STRING)
            return parser_error(p, "Expected a string literal after \",\"\n");
        if (max_len >= 0 && unescaped_len(p->source, p->value.string) > max_len)
            return parser_error(p, "String can't be longer than %d characters\n", max_len);
        (*count)++;
        tok = peek_next(p);
        if (tok == TOK_ERROR)
            return -1;
        if (tok != TOK_COMMA)
            return 0;
        scan_next(p);
    }
}

/* Rescan item `index` of a list validated by count_string_list, starting
 * at the head position saved before counting. */
static struct str_view next_list_item(struct c_ini_parser* p, int index)
{
    if (index > 0)
        scan_next(p);
    scan_next(p);
    return p->value.string;
}
"#;

const DYN_LISTS: &str = r#"
static void free_string_list(char** list)
{
    int i;
    if (list == NULL)
        return;
    for (i = 0; list[i] != NULL; ++i)
        free(list[i]);
    free(list);
}

static char** string_list_dup(const char* const* items)
{
    int count = 0, i;
    char** list;
    while (items[count] != NULL)
        count++;
    list = malloc(sizeof(char*) * (size_t)(count + 1));
    if (list == NULL)
        return NULL;
    for (i = 0; i != count; ++i)
    {
        list[i] = portable_strdup(items[i]);
        if (list[i] == NULL)
        {
            free_string_list(list);
            return NULL;
        }
    }
    list[count] = NULL;
    return list;
}
"#;

const BOOLS: &str = r#"
static int scan_bool(struct c_ini_parser* p, int* value)
{
    enum token tok = scan_next(p);
    if (tok == TOK_ERROR)
        return -1;
    if (tok == TOK_KEY && str_view_equal(p->source, p->value.string, "true"))
        *value = 1;
    else if (tok == TOK_KEY && str_view_equal(p->source, p->value.string, "false"))
        *value = 0;
    else if (tok == TOK_INTEGER && (p->value.integer_literal == 0 || p->value.integer_literal == 1))
        *value = (int)p->value.integer_literal;
    else
        return 1;
    return 0;
}
"#;

/// Emit the scanner and the helper groups `features` asks for.
pub(crate) fn emit(w: &mut CodeWriter, features: Features) {
    w.raw(SCANNER);
    if features.strings {
        w.raw(STRINGS);
    }
    if features.heap_strings {
        w.raw(HEAP_STRINGS);
    }
    if features.strdup || features.dyn_lists {
        w.raw(STRDUP);
    }
    if features.lists {
        w.raw(LISTS);
    }
    if features.dyn_lists {
        w.raw(DYN_LISTS);
    }
    if features.bools {
        w.raw(BOOLS);
    }
}
