use esengine::evaluate_script;

#[ctor::ctor]
fn __init_test_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default()).is_test(true).try_init();
}

fn eval(script: &str) -> String {
    match evaluate_script(script) {
        Ok(v) => v,
        Err(e) => e.to_string(),
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;

    #[test]
    fn define_property_defaults_to_non_writable() {
        let script = r#"
            var o = {};
            Object.defineProperty(o, 'x', { value: 1 });
            o.x = 2;
            var d = Object.getOwnPropertyDescriptor(o, 'x');
            [o.x, d.writable, d.enumerable, d.configurable].join()
        "#;
        assert_eq!(eval(script), "1,false,false,false");
    }

    #[test]
    fn strict_write_to_read_only_throws() {
        let script = r#"
            'use strict';
            var o = {};
            Object.defineProperty(o, 'x', { value: 1 });
            try { o.x = 2; 'no error' } catch (e) { e.name }
        "#;
        assert_eq!(eval(script), "TypeError");
    }

    #[test]
    fn redefining_non_configurable_property_throws() {
        let script = r#"
            var o = {};
            Object.defineProperty(o, 'x', { value: 1, configurable: false });
            try { Object.defineProperty(o, 'x', { value: 2 }); 'no error' } catch (e) { e.name + ':' + o.x }
        "#;
        assert_eq!(eval(script), "TypeError:1");
        let same_value = r#"
            var o = {};
            Object.defineProperty(o, 'x', { value: 1 });
            Object.defineProperty(o, 'x', { value: 1 });
            o.x
        "#;
        assert_eq!(eval(same_value), "1");
    }

    #[test]
    fn accessor_properties() {
        let script = r#"
            var log = [];
            var o = {
                _v: 1,
                get v() { log.push('get'); return this._v; },
                set v(x) { log.push('set'); this._v = x * 2; }
            };
            o.v = 5;
            log.push(o.v);
            log.join()
        "#;
        assert_eq!(eval(script), "set,get,10");
        let getter_only = r#"
            var o = {};
            Object.defineProperty(o, 'g', { get: function () { return 7; } });
            o.g = 1;
            o.g
        "#;
        assert_eq!(eval(getter_only), "7");
    }

    #[test]
    fn inherited_read_only_blocks_assignment() {
        let script = r#"
            var proto = {};
            Object.defineProperty(proto, 'x', { value: 1, writable: false });
            var child = Object.create(proto);
            child.x = 2;
            child.x + ',' + child.hasOwnProperty('x')
        "#;
        assert_eq!(eval(script), "1,false");
    }

    #[test]
    fn inherited_setter_is_called() {
        let script = r#"
            var seen;
            var proto = { set x(v) { seen = v; } };
            var child = Object.create(proto);
            child.x = 3;
            seen + ',' + child.hasOwnProperty('x')
        "#;
        assert_eq!(eval(script), "3,false");
    }

    #[test]
    fn array_length_semantics() {
        assert_eq!(eval("var a = [1, 2, 3]; a[5] = 6; a.length"), "6");
        assert_eq!(eval("var a = [1, 2, 3, 4]; a.length = 2; a.join() + '|' + a[3]"), "1,2|undefined");
        assert_eq!(eval("var a = []; a['2'] = 1; a.length"), "3");
        assert_eq!(eval("var a = []; a['02'] = 1; a.length"), "0");
        assert_eq!(eval("try { [].length = -1 } catch (e) { e.name }"), "RangeError");
        assert_eq!(eval("try { [].length = 1.5 } catch (e) { e.name }"), "RangeError");
    }

    #[test]
    fn array_length_stops_at_non_configurable_element() {
        let script = r#"
            var a = [1, 2, 3];
            Object.defineProperty(a, 1, { value: 2, configurable: false });
            a.length = 0;
            a.length
        "#;
        assert_eq!(eval(script), "2");
    }

    #[test]
    fn array_holes() {
        assert_eq!(eval("var a = [1, , 3]; a.length + ',' + (1 in a)"), "3,false");
        assert_eq!(eval("[, ,].length"), "2");
        assert_eq!(eval("[1, 2, ].length"), "2");
    }

    #[test]
    fn delete_operator() {
        assert_eq!(eval("var o = { a: 1 }; delete o.a; 'a' in o"), "false");
        assert_eq!(eval("delete Object.prototype"), "false");
        assert_eq!(
            eval("'use strict'; try { delete Object.prototype; } catch (e) { e.name }"),
            "TypeError"
        );
        assert_eq!(eval("var a = [1, 2]; delete a[0]; a.length + ',' + a[0]"), "2,undefined");
    }

    #[test]
    fn freeze_seal_and_prevent_extensions() {
        let script = r#"
            var o = Object.freeze({ a: 1 });
            o.a = 2; o.b = 3; delete o.a;
            [o.a, o.b, Object.isFrozen(o), Object.isSealed(o), Object.isExtensible(o)].join()
        "#;
        assert_eq!(eval(script), "1,,true,true,false");
        let sealed = r#"
            var o = Object.seal({ a: 1 });
            o.a = 2; delete o.a;
            o.a + ',' + Object.isFrozen(o)
        "#;
        assert_eq!(eval(sealed), "2,false");
        assert_eq!(
            eval("'use strict'; var o = Object.preventExtensions({}); try { o.x = 1; } catch (e) { e.name }"),
            "TypeError"
        );
    }

    #[test]
    fn string_index_properties() {
        assert_eq!(eval("var s = new String('ab'); s[0] + s[1] + s.length"), "ab2");
        assert_eq!(eval("var s = new String('ab'); s[0] = 'z'; s[0]"), "a");
        assert_eq!(eval("Object.getOwnPropertyNames(new String('ab')).join()"), "0,1,length");
        assert_eq!(eval("'ab'[5]"), "undefined");
    }

    #[test]
    fn for_in_enumeration() {
        let script = r#"
            var proto = { inherited: 1 };
            var o = Object.create(proto);
            o.b = 1; o.a = 2;
            Object.defineProperty(o, 'hidden', { value: 3, enumerable: false });
            var keys = [];
            for (var k in o) keys.push(k);
            keys.join()
        "#;
        assert_eq!(eval(script), "b,a,inherited");
        assert_eq!(eval("var n = 0; for (var k in null) n++; for (var k in undefined) n++; n"), "0");
        let shadowed = r#"
            var proto = { x: 1 };
            var o = Object.create(proto);
            Object.defineProperty(o, 'x', { value: 2, enumerable: false });
            var keys = [];
            for (var k in o) keys.push(k);
            keys.length
        "#;
        assert_eq!(eval(shadowed), "0");
    }

    #[test]
    fn for_in_skips_deleted_properties() {
        let script = r#"
            var o = { a: 1, b: 2, c: 3 };
            var seen = [];
            for (var k in o) { seen.push(k); delete o.c; }
            seen.join()
        "#;
        assert_eq!(eval(script), "a,b");
    }

    #[test]
    fn object_literal_restrictions() {
        assert!(eval("'use strict'; ({ a: 1, a: 2 })").starts_with("SyntaxError"));
        assert_eq!(eval("({ a: 1, a: 2 }).a"), "2");
        assert!(eval("({ a: 1, get a() { return 2; } })").starts_with("SyntaxError"));
    }

    #[test]
    fn prototype_accessor() {
        assert_eq!(eval("var p = { z: 1 }; var o = {}; o.__proto__ = p; o.z"), "1");
        assert_eq!(eval("Object.getPrototypeOf({}) === Object.prototype"), "true");
        assert_eq!(eval("Object.getPrototypeOf(Object.create(null))"), "null");
    }
}
